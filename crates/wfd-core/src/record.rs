//! Harvested records: the raw output of a dataset parser.

use serde::{Deserialize, Serialize};

/// Field carrying the source document language (`@language` attribute).
pub const FIELD_LANGUAGE: &str = "@language";
/// Field carrying the document creation date (`@creationDate` attribute).
pub const FIELD_CREATION_DATE: &str = "@creationDate";
/// Field added by the loader: where the document was read from.
pub const FIELD_SOURCE_URL: &str = "source_url";
/// Field added by the loader: the day the document was read.
pub const FIELD_RETRIEVAL_DATE: &str = "retrieval_date";

/// An ordered list of field → raw value pairs for a single entity.
///
/// A field may appear more than once (e.g. repeated
/// `swSignificantImpactType` elements); order is the document order, with
/// document-level fields first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
  fields: Vec<(String, String)>,
}

impl HarvestedRecord {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
    self.fields.push((field.into(), value.into()));
  }

  /// Builder form of [`HarvestedRecord::push`].
  pub fn with(mut self, field: &str, value: &str) -> Self {
    self.push(field, value);
    self
  }

  /// The first value of `field`, with surrounding whitespace trimmed.
  /// Empty values count as absent.
  pub fn get(&self, field: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .filter(|(name, _)| name == field)
      .map(|(_, value)| value.trim())
      .find(|value| !value.is_empty())
  }

  /// Every non-empty value of `field`, in document order.
  pub fn get_all<'a>(
    &'a self,
    field: &'a str,
  ) -> impl Iterator<Item = &'a str> + 'a {
    self
      .fields
      .iter()
      .filter(move |(name, _)| name == field)
      .map(|(_, value)| value.trim())
      .filter(|value| !value.is_empty())
  }

  pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
    self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
  }
}

impl FromIterator<(String, String)> for HarvestedRecord {
  fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
    Self { fields: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repeated_fields_keep_document_order() {
    let record = HarvestedRecord::new()
      .with("swSignificantImpactType", "POLL - Pollution")
      .with("euSurfaceWaterBodyCode", "SE1")
      .with("swSignificantImpactType", "  HYMO ")
      .with("swSignificantImpactType", "");
    let impacts: Vec<_> = record.get_all("swSignificantImpactType").collect();
    assert_eq!(impacts, vec!["POLL - Pollution", "HYMO"]);
    assert_eq!(record.get("euSurfaceWaterBodyCode"), Some("SE1"));
    assert_eq!(record.get("missing"), None);
  }

  #[test]
  fn value_outlives_the_field_name() {
    let record = HarvestedRecord::new()
      .with("countryCode", " ")
      .with("countryCode", "SE");
    let country = {
      let field = String::from("countryCode");
      record.get(&field)
    };
    assert_eq!(country, Some("SE"));
  }
}
