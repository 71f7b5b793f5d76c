//! Write plans: the additive changes proposed for one entity.

use serde::{Deserialize, Serialize};

use crate::{
  claim::{Reference, Statement, Terms},
  entity::Target,
};

/// The minimal set of additions needed to bring one entity up to date.
///
/// A plan never removes or overwrites anything already present in the
/// knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritePlan {
  pub target:     Target,
  /// Labels, descriptions and aliases to add.
  pub terms:      Terms,
  /// Statements to add, each carrying its reference block.
  pub statements: Vec<Statement>,
  /// Existing claims that only need this run's reference block attached.
  pub sourced:    Vec<Statement>,
  /// The reference block shared by every statement of the run, if any.
  pub reference:  Option<Reference>,
}

impl WritePlan {
  pub fn new(target: Target) -> Self {
    Self {
      target,
      terms: Terms::default(),
      statements: Vec::new(),
      sourced: Vec::new(),
      reference: None,
    }
  }

  /// True if dispatching this plan would change nothing.
  pub fn is_empty(&self) -> bool {
    self.target != Target::New
      && self.terms.is_empty()
      && self.statements.is_empty()
      && self.sourced.is_empty()
  }

  /// Number of statements flagged provisional.
  pub fn provisional_count(&self) -> usize {
    self.statements.iter().filter(|s| s.provisional).count()
  }
}
