//! Statement types: the claims written to the knowledge base.
//!
//! A statement is a (property, value) pair with optional qualifiers and
//! reference blocks. Two statements are the same claim when property, value
//! and the *set* of qualifiers agree; references never take part in that
//! comparison because a claim may pick up further sources over time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::{EntityId, PropertyId},
};

// ─── Values ──────────────────────────────────────────────────────────────────

/// The typed value of a statement, qualifier, or reference part.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
  Item(EntityId),
  Text(String),
  /// A decimal amount, kept as written in the source so equality is exact.
  Quantity {
    amount: String,
    unit:   Option<EntityId>,
  },
  Year(i32),
  Date(NaiveDate),
  /// The property has a value, but it is not known.
  SomeValue,
  /// The property is known to have no value.
  NoValue,
}

impl Value {
  /// Interpret an identifier taken from a mapping category.
  ///
  /// `novalue` and `somevalue` map to the special variants; anything else
  /// must be an item id.
  pub fn from_mapped(identifier: &str) -> Result<Self> {
    match identifier {
      "novalue" => Ok(Self::NoValue),
      "somevalue" => Ok(Self::SomeValue),
      other => other.parse().map(Self::Item),
    }
  }
}

impl From<EntityId> for Value {
  fn from(id: EntityId) -> Self { Self::Item(id) }
}

// ─── Snaks and references ────────────────────────────────────────────────────

/// A single property–value pair, used for qualifiers and reference parts.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Snak {
  pub property: PropertyId,
  pub value:    Value,
}

impl Snak {
  pub fn new(property: PropertyId, value: impl Into<Value>) -> Self {
    Self { property, value: value.into() }
  }
}

/// A reference block attached to a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
  /// Parts compared when deciding whether a claim is already sourced.
  pub tested:   Vec<Snak>,
  /// Parts carried along but never compared (e.g. retrieval date).
  #[serde(default)]
  pub untested: Vec<Snak>,
}

impl Reference {
  /// True if every tested part of `other` is present in this block.
  pub fn covers(&self, other: &Reference) -> bool {
    other.tested.iter().all(|snak| self.tested.contains(snak))
  }
}

// ─── Statements ──────────────────────────────────────────────────────────────

/// A claim about an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
  pub property:    PropertyId,
  pub value:       Value,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub qualifiers:  Vec<Snak>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub references:  Vec<Reference>,
  /// Computed without historical context; surfaced for review, never
  /// blocks a write.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub provisional: bool,
}

impl Statement {
  pub fn new(property: PropertyId, value: impl Into<Value>) -> Self {
    Self {
      property,
      value: value.into(),
      qualifiers: Vec::new(),
      references: Vec::new(),
      provisional: false,
    }
  }

  pub fn with_qualifier(mut self, qualifier: Snak) -> Self {
    if !self.qualifiers.contains(&qualifier) {
      self.qualifiers.push(qualifier);
    }
    self
  }

  pub fn with_reference(mut self, reference: Reference) -> Self {
    self.references.push(reference);
    self
  }

  /// The merge identity of this statement.
  pub fn claim_key(&self) -> ClaimKey {
    ClaimKey {
      property:   self.property,
      value:      self.value.clone(),
      qualifiers: self.qualifiers.iter().cloned().collect(),
    }
  }

  /// True if one of this statement's reference blocks covers `reference`.
  pub fn is_sourced_by(&self, reference: &Reference) -> bool {
    self.references.iter().any(|r| r.covers(reference))
  }
}

/// Equality key for merging: property, value and the qualifier set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimKey {
  pub property:   PropertyId,
  pub value:      Value,
  pub qualifiers: BTreeSet<Snak>,
}

// ─── Terms ───────────────────────────────────────────────────────────────────

/// Labels, descriptions and aliases keyed by language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
  #[serde(default)]
  pub labels:       BTreeMap<String, String>,
  #[serde(default)]
  pub descriptions: BTreeMap<String, String>,
  #[serde(default)]
  pub aliases:      BTreeMap<String, Vec<String>>,
}

impl Terms {
  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
      && self.descriptions.is_empty()
      && self.aliases.values().all(Vec::is_empty)
  }

  /// Append an alias unless the language already lists it.
  pub fn add_alias(&mut self, language: &str, alias: &str) {
    let entry = self.aliases.entry(language.to_string()).or_default();
    if !entry.iter().any(|a| a == alias) {
      entry.push(alias.to_string());
    }
  }

  /// True if `text` is the label or one of the aliases in `language`.
  pub fn names(&self, language: &str, text: &str) -> bool {
    let is_label = self
      .labels
      .get(language)
      .is_some_and(|l| same_name(l, text));
    let is_alias = self
      .aliases
      .get(language)
      .is_some_and(|a| a.iter().any(|x| same_name(x, text)));
    is_label || is_alias
  }
}

/// Case-insensitive name comparison over full Unicode lowercasing.
pub fn same_name(a: &str, b: &str) -> bool {
  a == b || a.to_lowercase() == b.to_lowercase()
}

// ─── Statement sets ──────────────────────────────────────────────────────────

/// Everything asserted about one entity: its terms and its statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSet {
  pub terms:      Terms,
  pub statements: Vec<Statement>,
}

impl StatementSet {
  /// The existing statement with the same claim key, if any.
  pub fn find_claim(&self, key: &ClaimKey) -> Option<&Statement> {
    self.statements.iter().find(|s| &s.claim_key() == key)
  }
}

/// Serialise a value into the compact JSON form used for storage and
/// identifier lookups.
pub fn value_to_json(value: &Value) -> Result<String> {
  serde_json::to_string(value).map_err(Error::from)
}
