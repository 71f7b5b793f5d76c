//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Values, qualifiers and references are stored as compact JSON. Entity ids
//! are stored by their numeric part, property ids as `P<digits>`.

use chrono::{DateTime, Utc};
use wfd_core::{
  claim::{Reference, Snak, Statement, Terms, value_to_json},
  entity::EntityId,
};

use crate::{Error, Result};

// ─── Ids and timestamps ──────────────────────────────────────────────────────

pub fn encode_entity(id: EntityId) -> i64 { id.number() as i64 }

pub fn decode_entity(raw: i64) -> EntityId { EntityId::new(raw as u64) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Term kinds ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
  Label,
  Description,
  Alias,
}

pub fn encode_term_kind(k: TermKind) -> &'static str {
  match k {
    TermKind::Label => "label",
    TermKind::Description => "description",
    TermKind::Alias => "alias",
  }
}

pub fn decode_term_kind(s: &str) -> Result<TermKind> {
  match s {
    "label" => Ok(TermKind::Label),
    "description" => Ok(TermKind::Description),
    "alias" => Ok(TermKind::Alias),
    other => Err(Error::UnknownTermKind(other.to_string())),
  }
}

/// Flatten terms into `(kind, language, value)` rows.
pub fn encode_terms(terms: &Terms) -> Vec<(&'static str, String, String)> {
  let labels = terms
    .labels
    .iter()
    .map(|(l, v)| (TermKind::Label, l, v));
  let descriptions = terms
    .descriptions
    .iter()
    .map(|(l, v)| (TermKind::Description, l, v));
  let aliases = terms
    .aliases
    .iter()
    .flat_map(|(l, vs)| vs.iter().map(move |v| (TermKind::Alias, l, v)));

  labels
    .chain(descriptions)
    .chain(aliases)
    .map(|(kind, language, value)| {
      (encode_term_kind(kind), language.clone(), value.clone())
    })
    .collect()
}

// ─── Statements ──────────────────────────────────────────────────────────────

/// Column values for one `statements` row.
pub struct EncodedStatement {
  pub property:        String,
  pub value_json:      String,
  pub qualifiers_json: String,
  pub references_json: String,
  pub provisional:     bool,
}

pub fn encode_statement(s: &Statement) -> Result<EncodedStatement> {
  Ok(EncodedStatement {
    property:        s.property.to_string(),
    value_json:      value_to_json(&s.value)?,
    qualifiers_json: serde_json::to_string(&s.qualifiers)?,
    references_json: serde_json::to_string(&s.references)?,
    provisional:     s.provisional,
  })
}

pub fn encode_references(references: &[Reference]) -> Result<String> {
  Ok(serde_json::to_string(references)?)
}

pub fn decode_references(s: &str) -> Result<Vec<Reference>> {
  Ok(serde_json::from_str(s)?)
}

pub fn decode_qualifiers(s: &str) -> Result<Vec<Snak>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `statements` row.
pub struct RawStatement {
  pub statement_id:    i64,
  pub property:        String,
  pub value_json:      String,
  pub qualifiers_json: String,
  pub references_json: String,
  pub provisional:     bool,
}

impl RawStatement {
  pub fn into_statement(self) -> Result<Statement> {
    Ok(Statement {
      property:    self.property.parse()?,
      value:       serde_json::from_str(&self.value_json)?,
      qualifiers:  decode_qualifiers(&self.qualifiers_json)?,
      references:  decode_references(&self.references_json)?,
      provisional: self.provisional,
    })
  }
}

/// Raw strings read directly from a `terms` row.
pub struct RawTerm {
  pub kind:     String,
  pub language: String,
  pub value:    String,
}

/// Rebuild [`Terms`] from rows in insertion order.
pub fn decode_terms(rows: Vec<RawTerm>) -> Result<Terms> {
  let mut terms = Terms::default();
  for row in rows {
    match decode_term_kind(&row.kind)? {
      TermKind::Label => {
        terms.labels.insert(row.language, row.value);
      }
      TermKind::Description => {
        terms.descriptions.insert(row.language, row.value);
      }
      TermKind::Alias => terms.add_alias(&row.language, &row.value),
    }
  }
  Ok(terms)
}

#[cfg(test)]
mod tests {
  use wfd_core::{claim::Value, vocab};

  use super::*;

  #[test]
  fn statement_row_decodes_to_the_same_statement() {
    let statement = Statement::new(vocab::AREA, Value::Quantity {
      amount: "990".into(),
      unit:   Some(vocab::SQUARE_KILOMETRE),
    })
    .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(2016)));
    let encoded = encode_statement(&statement).unwrap();
    let raw = RawStatement {
      statement_id:    1,
      property:        encoded.property,
      value_json:      encoded.value_json,
      qualifiers_json: encoded.qualifiers_json,
      references_json: encoded.references_json,
      provisional:     encoded.provisional,
    };
    assert_eq!(raw.into_statement().unwrap(), statement);
  }

  #[test]
  fn unknown_term_kind_is_rejected() {
    let rows = vec![RawTerm {
      kind:     "nickname".into(),
      language: "en".into(),
      value:    "x".into(),
    }];
    assert!(matches!(decode_terms(rows), Err(Error::UnknownTermKind(_))));
  }

  #[test]
  fn terms_flatten_every_alias() {
    let mut terms = Terms::default();
    terms.labels.insert("en".into(), "Bothnian Sea".into());
    terms.add_alias("en", "SE1");
    terms.add_alias("en", "Bottenhavet");
    let rows = encode_terms(&terms);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].0, "label");
    assert!(rows[1..].iter().all(|(kind, _, _)| *kind == "alias"));
  }
}
