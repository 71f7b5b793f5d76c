//! Claim synthesizer: canonical record → target statement set.

use std::collections::HashSet;

use wfd_core::{
  claim::{Reference, Snak, Statement, StatementSet, Value},
  vocab,
};

use crate::{
  mapping::MappingTable,
  normalize::{CanonicalRecord, Provenance},
};

/// Builds the full set of statements a record should end up with.
pub struct Synthesizer<'a> {
  table: &'a MappingTable,
  year:  i32,
}

impl<'a> Synthesizer<'a> {
  pub fn new(table: &'a MappingTable, year: i32) -> Self {
    Self { table, year }
  }

  /// The desired state of the entity described by `record`.
  ///
  /// Statements come out class first, then the identifier, then the record's
  /// property values in order. Every statement carries the record's
  /// reference block.
  pub fn synthesize(&self, record: &CanonicalRecord) -> StatementSet {
    let reference = reference_for(&record.provenance);
    let identifier = Statement::new(
      record.kind.identifier_property(),
      Value::Text(record.unique_code.clone()),
    );

    let candidates = std::iter::once(Statement::new(vocab::INSTANCE_OF, record.class))
      .chain(std::iter::once(identifier))
      .chain(record.property_values.iter().map(|pv| {
        let mut statement = Statement::new(pv.property, pv.value.clone());
        for qualifier in &pv.qualifiers {
          statement = statement.with_qualifier(qualifier.clone());
        }
        statement.provisional = pv.provisional;
        statement
      }));

    let mut seen = HashSet::new();
    let mut statements = Vec::new();
    for mut statement in candidates {
      if self.table.temporal_properties().contains(&statement.property) {
        statement = statement
          .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(self.year)));
      }
      if seen.insert(statement.claim_key()) {
        statements.push(statement.with_reference(reference.clone()));
      }
    }

    StatementSet { terms: record.terms.clone(), statements }
  }
}

/// The reference block for data taken from `provenance`.
///
/// Dataset and URL identify the source and are compared when checking
/// whether a claim is already sourced; the dates are informational.
pub fn reference_for(provenance: &Provenance) -> Reference {
  let mut reference = Reference {
    tested:   vec![Snak::new(vocab::STATED_IN, provenance.dataset)],
    untested: Vec::new(),
  };
  if let Some(url) = &provenance.source_url {
    reference
      .tested
      .push(Snak::new(vocab::REFERENCE_URL, Value::Text(url.clone())));
  }
  if let Some(day) = provenance.published {
    reference
      .untested
      .push(Snak::new(vocab::PUBLICATION_DATE, Value::Date(day)));
  }
  if let Some(day) = provenance.retrieved {
    reference
      .untested
      .push(Snak::new(vocab::RETRIEVED, Value::Date(day)));
  }
  reference
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use wfd_core::{
    claim::Terms,
    config::ImportKind,
    entity::EntityId,
  };

  use super::*;
  use crate::{mapping::tests::table, normalize::PropertyValue};

  fn record() -> CanonicalRecord {
    CanonicalRecord {
      kind:            ImportKind::Swb,
      unique_code:     "SE655587-158869".into(),
      class:           EntityId::new(23397),
      terms:           Terms::default(),
      property_values: vec![
        PropertyValue::new(vocab::COUNTRY, EntityId::new(34)),
        PropertyValue {
          property:    vocab::SIGNIFICANT_IMPACT,
          value:       Value::Item(EntityId::new(27074523)),
          qualifiers:  Vec::new(),
          provisional: true,
        },
        PropertyValue::new(vocab::COUNTRY, EntityId::new(34)),
      ],
      parent:          None,
      provenance:      Provenance {
        dataset:    EntityId::new(27074437),
        source_url: Some("http://cdr.eionet.europa.eu/se/swb.xml".into()),
        published:  NaiveDate::from_ymd_opt(2016, 3, 22),
        retrieved:  None,
      },
    }
  }

  #[test]
  fn class_and_identifier_come_first() {
    let table = table(ImportKind::Swb);
    let set = Synthesizer::new(&table, 2016).synthesize(&record());
    assert_eq!(set.statements[0].property, vocab::INSTANCE_OF);
    assert_eq!(set.statements[0].value, Value::Item(EntityId::new(23397)));
    assert_eq!(set.statements[1].property, vocab::EU_SWB_CODE);
    assert_eq!(
      set.statements[1].value,
      Value::Text("SE655587-158869".into())
    );
  }

  #[test]
  fn duplicate_values_collapse() {
    let table = table(ImportKind::Swb);
    let set = Synthesizer::new(&table, 2016).synthesize(&record());
    let countries = set
      .statements
      .iter()
      .filter(|s| s.property == vocab::COUNTRY)
      .count();
    assert_eq!(countries, 1);
    assert_eq!(set.statements.len(), 4);
  }

  #[test]
  fn temporal_properties_get_the_reporting_year() {
    let table = table(ImportKind::Swb);
    let set = Synthesizer::new(&table, 2016).synthesize(&record());
    let impact = set
      .statements
      .iter()
      .find(|s| s.property == vocab::SIGNIFICANT_IMPACT)
      .unwrap();
    assert_eq!(
      impact.qualifiers,
      vec![Snak::new(vocab::POINT_IN_TIME, Value::Year(2016))]
    );
    assert!(impact.provisional);
    let country = set
      .statements
      .iter()
      .find(|s| s.property == vocab::COUNTRY)
      .unwrap();
    assert!(country.qualifiers.is_empty());
  }

  #[test]
  fn every_statement_carries_the_reference() {
    let table = table(ImportKind::Swb);
    let set = Synthesizer::new(&table, 2016).synthesize(&record());
    let expected = reference_for(&record().provenance);
    assert_eq!(expected.tested.len(), 2);
    assert_eq!(expected.untested.len(), 1);
    assert!(set.statements.iter().all(|s| s.references == vec![expected.clone()]));
  }
}
