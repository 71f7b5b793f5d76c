//! Record normalizer: harvested record → canonical record.
//!
//! Every raw code is translated through the [`MappingTable`] here, once, so
//! later stages only ever see typed knowledge-base values.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::warn;
use wfd_core::{
  claim::{Snak, Terms, Value},
  config::{ImportKind, RunConfiguration},
  entity::{EntityId, PropertyId},
  record::{
    FIELD_CREATION_DATE, FIELD_LANGUAGE, FIELD_RETRIEVAL_DATE,
    FIELD_SOURCE_URL, HarvestedRecord,
  },
  vocab,
};

use crate::{
  error::{RecordError, Result},
  mapping::{
    COMPETENT_AUTHORITY, COUNTRY_CODE, DATASET, DOCUMENT_LANGUAGE,
    ECOLOGICAL_STATUS, IMPACT_TYPE, LANGUAGE_CODE, MappingTable, SWB_CATEGORY,
  },
};

// ─── Source fields ───────────────────────────────────────────────────────────

pub const FIELD_COUNTRY: &str = "countryCode";
pub const FIELD_RBD_CODE: &str = "euRBDCode";
pub const FIELD_PRIME_AUTHORITY: &str = "primeCompetentAuthority";
pub const FIELD_RBD_AREA: &str = "rbdArea";
pub const FIELD_INTERNATIONAL: &str = "internationalRBD";
pub const FIELD_SWB_CATEGORY: &str = "surfaceWaterBodyCategory";
pub const FIELD_IMPACT: &str = "swSignificantImpactType";
pub const FIELD_STATUS: &str = "swEcologicalStatusOrPotentialValue";

/// Raw ecological status meaning "assessed, result unknown".
const STATUS_UNKNOWN: &str = "Unknown";
/// Raw ecological status meaning "no status applies".
const STATUS_NOT_APPLICABLE: &str = "Not applicable";

// ─── Canonical record ────────────────────────────────────────────────────────

/// One value destined to become a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
  pub property:    PropertyId,
  pub value:       Value,
  pub qualifiers:  Vec<Snak>,
  /// Computed without prior years' data.
  pub provisional: bool,
}

impl PropertyValue {
  pub fn new(property: PropertyId, value: impl Into<Value>) -> Self {
    Self {
      property,
      value: value.into(),
      qualifiers: Vec::new(),
      provisional: false,
    }
  }

  fn provisional(mut self) -> Self {
    self.provisional = true;
    self
  }
}

/// A link to another entity known only by its identifier code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
  /// The property the link is stated under (e.g. part-of).
  pub property:            PropertyId,
  /// The identifier property the parent is found by.
  pub identifier_property: PropertyId,
  pub code:                String,
}

/// Where the record's data comes from; becomes the reference block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
  pub dataset:    EntityId,
  pub source_url: Option<String>,
  pub published:  Option<NaiveDate>,
  pub retrieved:  Option<NaiveDate>,
}

/// A harvested record with every code resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
  pub kind:            ImportKind,
  /// Stable identifier used to find the entity again.
  pub unique_code:     String,
  /// The class the entity is an instance of.
  pub class:           EntityId,
  pub terms:           Terms,
  pub property_values: Vec<PropertyValue>,
  pub parent:          Option<ParentLink>,
  pub provenance:      Provenance,
}

impl CanonicalRecord {
  /// Record the resolved parent entity as a property value.
  pub fn link_parent(&mut self, parent: EntityId) {
    if let Some(link) = &self.parent {
      self
        .property_values
        .push(PropertyValue::new(link.property, parent));
    }
  }
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Converts harvested records into canonical records for one run.
pub struct Normalizer<'a> {
  table:  &'a MappingTable,
  config: &'a RunConfiguration,
}

impl<'a> Normalizer<'a> {
  pub fn new(table: &'a MappingTable, config: &'a RunConfiguration) -> Self {
    Self { table, config }
  }

  /// Translate `record`; the first unmapped code fails the record.
  pub fn normalize(&self, record: &HarvestedRecord) -> Result<CanonicalRecord> {
    let kind = self.table.kind();
    let unique_code = require(record, kind.code_field())?.to_string();

    // Codes first: the country decides description wording and the dataset.
    let country_code = require(record, FIELD_COUNTRY)?;
    let country = self.table.resolve_item(COUNTRY_CODE, country_code)?;
    let dataset = self.table.resolve_item(
      DATASET,
      &format!("{country_code}/{}", self.config.year),
    )?;

    let (class, property_values, parent) = match kind {
      ImportKind::Rbd => self.rbd_values(record, &unique_code, country)?,
      ImportKind::Swb => self.swb_values(record, country)?,
    };

    let document_language = record
      .get(FIELD_LANGUAGE)
      .map(|code| self.table.resolve(LANGUAGE_CODE, code))
      .transpose()?;

    let mut terms = Terms {
      labels:       self.labels(record, document_language),
      descriptions: self.descriptions(record, country_code)?,
      aliases:      BTreeMap::new(),
    };
    if kind == ImportKind::Rbd {
      let languages: Vec<String> = terms.labels.keys().cloned().collect();
      for language in languages {
        if terms.labels[&language] != unique_code {
          terms.add_alias(&language, &unique_code);
        }
      }
    }

    let provenance = Provenance {
      dataset,
      source_url: record.get(FIELD_SOURCE_URL).map(str::to_string),
      published: record.get(FIELD_CREATION_DATE).and_then(parse_date),
      retrieved: record.get(FIELD_RETRIEVAL_DATE).and_then(parse_date),
    };

    Ok(CanonicalRecord {
      kind,
      unique_code,
      class,
      terms,
      property_values,
      parent,
      provenance,
    })
  }

  /// Every `(category, code)` in `records` that the table cannot resolve,
  /// deduplicated, in first-seen order.
  pub fn audit(&self, records: &[HarvestedRecord]) -> Vec<(String, String)> {
    let mut seen = BTreeSet::new();
    let mut missing = Vec::new();
    for record in records {
      for (category, code) in self.codes(record) {
        if !self.table.contains(category, &code)
          && seen.insert((category, code.clone()))
        {
          missing.push((category.to_string(), code));
        }
      }
    }
    missing
  }

  /// The `(category, code)` pairs `record` needs resolved.
  fn codes(&self, record: &HarvestedRecord) -> Vec<(&'static str, String)> {
    let mut codes = Vec::new();
    if let Some(country) = record.get(FIELD_COUNTRY) {
      codes.push((COUNTRY_CODE, country.to_string()));
      codes.push((DATASET, format!("{country}/{}", self.config.year)));
    }
    if let Some(language) = record.get(FIELD_LANGUAGE) {
      codes.push((LANGUAGE_CODE, language.to_string()));
    }
    match self.table.kind() {
      ImportKind::Rbd => {
        if let Some(authority) = record.get(FIELD_PRIME_AUTHORITY) {
          codes.push((COMPETENT_AUTHORITY, authority.to_string()));
        }
      }
      ImportKind::Swb => {
        if let Some(category) = record.get(FIELD_SWB_CATEGORY) {
          codes.push((SWB_CATEGORY, category.to_string()));
        }
        for impact in record.get_all(FIELD_IMPACT) {
          codes.push((IMPACT_TYPE, impact_code(impact).to_string()));
        }
        if let Some(status) = record.get(FIELD_STATUS)
          && status != STATUS_UNKNOWN
          && status != STATUS_NOT_APPLICABLE
        {
          codes.push((ECOLOGICAL_STATUS, status.to_string()));
        }
      }
    }
    codes
  }

  fn rbd_values(
    &self,
    record: &HarvestedRecord,
    unique_code: &str,
    country: EntityId,
  ) -> Result<(EntityId, Vec<PropertyValue>, Option<ParentLink>)> {
    let authority = self.table.resolve_item(
      COMPETENT_AUTHORITY,
      require(record, FIELD_PRIME_AUTHORITY)?,
    )?;

    let mut values = vec![
      PropertyValue::new(vocab::COUNTRY, country),
      PropertyValue::new(vocab::OPERATOR, authority),
    ];
    if let Some(area) = record.get(FIELD_RBD_AREA) {
      match parse_amount(area) {
        Some(amount) => values.push(PropertyValue::new(vocab::AREA, Value::Quantity {
          amount,
          unit: Some(vocab::SQUARE_KILOMETRE),
        })),
        None => warn!(code = unique_code, area, "area is not numeric; skipped"),
      }
    }
    Ok((vocab::RIVER_BASIN_DISTRICT, values, None))
  }

  fn swb_values(
    &self,
    record: &HarvestedRecord,
    country: EntityId,
  ) -> Result<(EntityId, Vec<PropertyValue>, Option<ParentLink>)> {
    let class = self
      .table
      .resolve_item(SWB_CATEGORY, require(record, FIELD_SWB_CATEGORY)?)?;
    let parent = ParentLink {
      property:            vocab::PART_OF,
      identifier_property: vocab::EU_RBD_CODE,
      code:                require(record, FIELD_RBD_CODE)?.to_string(),
    };

    let mut values = vec![PropertyValue::new(vocab::COUNTRY, country)];

    // Whether an impact is still current depends on earlier reports, which
    // are not consulted; every impact value is therefore provisional.
    let mut impacts = Vec::new();
    for raw in record.get_all(FIELD_IMPACT) {
      let value = self.table.resolve_value(IMPACT_TYPE, impact_code(raw))?;
      impacts.push(PropertyValue::new(vocab::SIGNIFICANT_IMPACT, value).provisional());
    }
    if impacts.is_empty() {
      impacts.push(
        PropertyValue::new(vocab::SIGNIFICANT_IMPACT, Value::NoValue).provisional(),
      );
    }
    values.extend(impacts);

    if let Some(status) = self.ecological_status(record)? {
      values.push(PropertyValue::new(vocab::ECOLOGICAL_STATUS, status));
    }

    Ok((class, values, Some(parent)))
  }

  fn ecological_status(&self, record: &HarvestedRecord) -> Result<Option<Value>> {
    let Some(raw) = record.get(FIELD_STATUS) else {
      return Ok(None);
    };
    if let Ok(id) = self.table.resolve_item(ECOLOGICAL_STATUS, raw) {
      return Ok(Some(Value::Item(id)));
    }
    match raw {
      STATUS_UNKNOWN => Ok(Some(Value::SomeValue)),
      STATUS_NOT_APPLICABLE => Ok(None),
      other => Err(RecordError::unmapped(ECOLOGICAL_STATUS, other)),
    }
  }

  /// Labels from the configured sources; a later source overrides an
  /// earlier one in the same language.
  fn labels(
    &self,
    record: &HarvestedRecord,
    document_language: Option<&str>,
  ) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    for source in self.table.label_sources() {
      let Some(text) = record.get(&source.field) else {
        continue;
      };
      if self.table.is_ignored_name(text) {
        continue;
      }
      let language = if source.language == DOCUMENT_LANGUAGE {
        match document_language {
          Some(language) => language,
          None => continue,
        }
      } else {
        source.language.as_str()
      };
      if self.table.is_language_configured(language) {
        labels.insert(language.to_string(), text.to_string());
      }
    }
    labels
  }

  fn descriptions(
    &self,
    record: &HarvestedRecord,
    country_code: &str,
  ) -> Result<BTreeMap<String, String>> {
    let variant = match self.table.kind() {
      ImportKind::Rbd if record.get(FIELD_INTERNATIONAL) == Some("Yes") => {
        "international"
      }
      ImportKind::Rbd => "national",
      ImportKind::Swb => "default",
    };

    let mut descriptions = BTreeMap::new();
    for language in self.table.languages() {
      let Some(template) = self.table.description(variant, language) else {
        continue;
      };
      let text = if template.contains("{country}") {
        let name = self.table.country_name(country_code, language)?;
        template.replace("{country}", name)
      } else {
        template.to_string()
      };
      descriptions.insert(language.clone(), text);
    }
    Ok(descriptions)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn require<'r>(record: &'r HarvestedRecord, field: &str) -> Result<&'r str> {
  record
    .get(field)
    .ok_or_else(|| RecordError::MissingField(field.to_string()))
}

/// `"NUTR - Nutrient pollution"` → `"NUTR"`.
fn impact_code(raw: &str) -> &str {
  raw.split(" - ").next().unwrap_or(raw).trim()
}

/// Accept plain decimal amounts only; returns the trimmed text.
fn parse_amount(raw: &str) -> Option<String> {
  let raw = raw.trim();
  let value: f64 = raw.parse().ok()?;
  (value.is_finite() && value >= 0.0).then(|| raw.to_string())
}

/// Dates appear as `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
  let day = raw.get(..10)?;
  NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
