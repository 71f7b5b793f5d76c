//! Statement merger: desired state vs. current state → additive write plan.
//!
//! Nothing already in the knowledge base is ever removed or overwritten.
//! Claims present with a different source only pick up our reference block.

use std::collections::HashSet;

use wfd_core::{
  claim::{StatementSet, same_name},
  entity::Target,
  plan::WritePlan,
};

/// Compute the additions that bring `existing` up to `wanted`.
///
/// For [`Target::New`], `existing` is empty and everything wanted ends up in
/// the plan.
pub fn merge(
  target: Target,
  existing: &StatementSet,
  wanted: &StatementSet,
) -> WritePlan {
  let mut plan = WritePlan::new(target);
  plan.reference = wanted
    .statements
    .first()
    .and_then(|s| s.references.first())
    .cloned();

  let mut seen = HashSet::new();
  for statement in &wanted.statements {
    let key = statement.claim_key();
    if !seen.insert(key.clone()) {
      continue;
    }
    match existing.find_claim(&key) {
      None => plan.statements.push(statement.clone()),
      Some(current) => {
        let unsourced: Vec<_> = statement
          .references
          .iter()
          .filter(|r| !current.is_sourced_by(r))
          .cloned()
          .collect();
        if !unsourced.is_empty() {
          let mut sourced = current.clone();
          sourced.references = unsourced;
          plan.sourced.push(sourced);
        }
      }
    }
  }

  merge_terms(&mut plan, existing, wanted);
  plan
}

fn merge_terms(plan: &mut WritePlan, existing: &StatementSet, wanted: &StatementSet) {
  let current = &existing.terms;
  let additions = &mut plan.terms;

  for (language, label) in &wanted.terms.labels {
    match current.labels.get(language) {
      None => {
        additions.labels.insert(language.clone(), label.clone());
      }
      // A different existing label is kept; ours becomes an alias.
      Some(_) if !current.names(language, label) => {
        additions.add_alias(language, label);
      }
      Some(_) => {}
    }
  }

  for (language, description) in &wanted.terms.descriptions {
    if !current.descriptions.contains_key(language) {
      additions
        .descriptions
        .insert(language.clone(), description.clone());
    }
  }

  for (language, aliases) in &wanted.terms.aliases {
    for alias in aliases {
      let is_new_label = additions
        .labels
        .get(language)
        .is_some_and(|l| same_name(l, alias));
      if !current.names(language, alias) && !is_new_label {
        additions.add_alias(language, alias);
      }
    }
  }

  additions.aliases.retain(|_, list| !list.is_empty());
}

#[cfg(test)]
mod tests {
  use wfd_core::{
    claim::{Reference, Snak, Statement, Terms, Value},
    entity::EntityId,
    vocab,
  };

  use super::*;

  fn reference(dataset: u64) -> Reference {
    Reference {
      tested:   vec![Snak::new(vocab::STATED_IN, EntityId::new(dataset))],
      untested: vec![],
    }
  }

  fn status(value: u64, dataset: u64) -> Statement {
    Statement::new(vocab::ECOLOGICAL_STATUS, EntityId::new(value))
      .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(2016)))
      .with_reference(reference(dataset))
  }

  fn wanted() -> StatementSet {
    let mut terms = Terms::default();
    terms.labels.insert("en".into(), "Bothnian Sea".into());
    terms.descriptions.insert("en".into(), "river basin district in Sweden".into());
    terms.add_alias("en", "SE5101");
    StatementSet {
      terms,
      statements: vec![
        Statement::new(vocab::INSTANCE_OF, vocab::RIVER_BASIN_DISTRICT)
          .with_reference(reference(1)),
        status(42, 1),
      ],
    }
  }

  #[test]
  fn new_target_takes_everything() {
    let plan = merge(Target::New, &StatementSet::default(), &wanted());
    assert_eq!(plan.statements.len(), 2);
    assert_eq!(plan.terms, wanted().terms);
    assert_eq!(plan.reference, Some(reference(1)));
  }

  #[test]
  fn merging_the_wanted_state_into_itself_is_empty() {
    let target = Target::Existing(EntityId::new(7));
    let plan = merge(target, &wanted(), &wanted());
    assert!(plan.is_empty(), "unexpected plan: {plan:?}");
  }

  #[test]
  fn claim_with_other_source_only_gets_the_reference() {
    let existing = StatementSet {
      terms:      wanted().terms,
      statements: vec![
        Statement::new(vocab::INSTANCE_OF, vocab::RIVER_BASIN_DISTRICT)
          .with_reference(reference(1)),
        status(42, 2),
      ],
    };
    let plan = merge(Target::Existing(EntityId::new(7)), &existing, &wanted());
    assert!(plan.statements.is_empty());
    assert_eq!(plan.sourced.len(), 1);
    assert_eq!(plan.sourced[0].references, vec![reference(1)]);
  }

  #[test]
  fn different_qualifier_is_a_different_claim() {
    let mut old = status(42, 1);
    old.qualifiers = vec![Snak::new(vocab::POINT_IN_TIME, Value::Year(2010))];
    let existing = StatementSet {
      terms:      wanted().terms,
      statements: vec![
        Statement::new(vocab::INSTANCE_OF, vocab::RIVER_BASIN_DISTRICT)
          .with_reference(reference(1)),
        old,
      ],
    };
    let plan = merge(Target::Existing(EntityId::new(7)), &existing, &wanted());
    assert_eq!(plan.statements, vec![status(42, 1)]);
  }

  #[test]
  fn existing_terms_are_never_overwritten() {
    let mut terms = Terms::default();
    terms.labels.insert("en".into(), "Bottenhavet".into());
    terms.descriptions.insert("en".into(), "water district".into());
    let existing = StatementSet { terms, statements: wanted().statements };

    let plan = merge(Target::Existing(EntityId::new(7)), &existing, &wanted());
    assert!(plan.terms.labels.is_empty());
    assert!(plan.terms.descriptions.is_empty());
    assert_eq!(
      plan.terms.aliases["en"],
      vec!["Bothnian Sea".to_string(), "SE5101".to_string()]
    );
  }

  #[test]
  fn alias_equal_to_existing_label_is_dropped() {
    let mut terms = Terms::default();
    terms.labels.insert("en".into(), "se5101".into());
    let existing = StatementSet { terms, statements: wanted().statements };
    let mut wanted = wanted();
    wanted.terms.labels.clear();

    let plan = merge(Target::Existing(EntityId::new(7)), &existing, &wanted);
    assert!(plan.terms.aliases.is_empty());
  }

  #[test]
  fn label_differing_only_in_case_is_not_an_alias() {
    let mut terms = Terms::default();
    terms.labels.insert("sv".into(), "IVÖSJÖN".into());
    let existing = StatementSet { terms, statements: wanted().statements };
    let mut wanted = StatementSet::default();
    wanted.terms.labels.insert("sv".into(), "Ivösjön".into());

    let plan = merge(Target::Existing(EntityId::new(7)), &existing, &wanted);
    assert!(plan.is_empty(), "unexpected plan: {plan:?}");
  }
}
