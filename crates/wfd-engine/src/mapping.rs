//! The mapping table: raw dataset codes → knowledge-base identifiers.
//!
//! Loaded once per run from a JSON document and validated against the
//! categories the active import kind needs. After loading it is read-only.

use std::{
  collections::{BTreeMap, BTreeSet},
  path::Path,
};

use serde::Deserialize;
use tracing::{debug, warn};
use wfd_core::{
  claim::Value,
  config::ImportKind,
  entity::{EntityId, PropertyId},
};

use crate::error::{MappingError, RecordError};

// ─── Category names ──────────────────────────────────────────────────────────

pub const DATASET: &str = "dataset";
pub const COUNTRY_CODE: &str = "countryCode";
pub const LANGUAGE_CODE: &str = "languageCode";
pub const COMPETENT_AUTHORITY: &str = "CompetentAuthority";
pub const SWB_CATEGORY: &str = "surfaceWaterBodyCategory";
pub const IMPACT_TYPE: &str = "swSignificantImpactType";
pub const ECOLOGICAL_STATUS: &str = "swEcologicalStatusOrPotentialValue";
/// Pseudo-category reported when a country name is missing for a language.
pub const COUNTRY_NAMES: &str = "countryNames";

/// Label-source language meaning "the language the document is written in".
pub const DOCUMENT_LANGUAGE: &str = "document";

/// Description variants each import kind must provide.
fn required_descriptions(kind: ImportKind) -> &'static [&'static str] {
  match kind {
    ImportKind::Rbd => &["national", "international"],
    ImportKind::Swb => &["default"],
  }
}

/// Categories that must be present and non-empty for `kind`.
pub fn required_categories(kind: ImportKind) -> &'static [&'static str] {
  match kind {
    ImportKind::Rbd => {
      &[DATASET, COUNTRY_CODE, LANGUAGE_CODE, COMPETENT_AUTHORITY]
    }
    ImportKind::Swb => &[
      DATASET,
      COUNTRY_CODE,
      LANGUAGE_CODE,
      SWB_CATEGORY,
      IMPACT_TYPE,
      ECOLOGICAL_STATUS,
    ],
  }
}

// ─── Document shape ──────────────────────────────────────────────────────────

/// A record field that may supply a label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelSource {
  pub field:    String,
  /// A language tag, or [`DOCUMENT_LANGUAGE`].
  #[serde(default = "document_language")]
  pub language: String,
}

fn document_language() -> String { DOCUMENT_LANGUAGE.to_string() }

/// The mapping document as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
  /// Languages the knowledge base accepts terms in.
  pub languages:           Vec<String>,
  #[serde(default)]
  pub categories:          BTreeMap<String, BTreeMap<String, String>>,
  /// Country code → language → country name, for description templates.
  #[serde(default)]
  pub country_names:       BTreeMap<String, BTreeMap<String, String>>,
  /// Import kind → label sources in ascending precedence.
  #[serde(default)]
  pub label_sources:       BTreeMap<String, Vec<LabelSource>>,
  /// Import kind → variant → language → template.
  #[serde(default)]
  pub descriptions:
    BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
  /// Placeholder names never used as labels (compared case-insensitively).
  #[serde(default)]
  pub ignored_names:       Vec<String>,
  /// Properties whose statements are dated with the reporting year.
  #[serde(default)]
  pub temporal_properties: BTreeSet<PropertyId>,
}

// ─── Mapping table ───────────────────────────────────────────────────────────

/// Validated, read-only lookup structure for one run.
#[derive(Debug, Clone)]
pub struct MappingTable {
  kind:                ImportKind,
  languages:           Vec<String>,
  categories:          BTreeMap<String, BTreeMap<String, String>>,
  country_names:       BTreeMap<String, BTreeMap<String, String>>,
  label_sources:       Vec<LabelSource>,
  descriptions:        BTreeMap<String, BTreeMap<String, String>>,
  ignored_names:       Vec<String>,
  temporal_properties: BTreeSet<PropertyId>,
}

impl MappingTable {
  /// Read and validate the mapping document at `path`.
  pub fn load(
    path: impl AsRef<Path>,
    kind: ImportKind,
  ) -> Result<Self, MappingError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| {
      MappingError::Load { path: path.to_path_buf(), source }
    })?;
    Self::from_json(&raw, kind)
  }

  /// Parse and validate a mapping document held in memory.
  pub fn from_json(raw: &str, kind: ImportKind) -> Result<Self, MappingError> {
    let document: MappingDocument = serde_json::from_str(raw)?;
    Self::from_document(document, kind)
  }

  /// Validate `document` for `kind`.
  pub fn from_document(
    document: MappingDocument,
    kind: ImportKind,
  ) -> Result<Self, MappingError> {
    if document.languages.is_empty() {
      return Err(MappingError::NoLanguages);
    }

    for category in required_categories(kind) {
      let present = document
        .categories
        .get(*category)
        .is_some_and(|codes| !codes.is_empty());
      if !present {
        return Err(MappingError::MissingCategory(category.to_string()));
      }
    }

    for (category, codes) in &document.categories {
      if category == LANGUAGE_CODE {
        continue;
      }
      for (code, identifier) in codes {
        if Value::from_mapped(identifier).is_err() {
          return Err(MappingError::InvalidIdentifier {
            category:   category.clone(),
            code:       code.clone(),
            identifier: identifier.clone(),
          });
        }
      }
    }

    let mut descriptions = document
      .descriptions
      .get(kind.as_str())
      .cloned()
      .unwrap_or_default();
    for variant in required_descriptions(kind) {
      let texts = descriptions.entry(variant.to_string()).or_default();
      if let Some(language) =
        document.languages.iter().find(|l| !texts.contains_key(*l))
      {
        return Err(MappingError::MissingDescription {
          kind,
          variant: variant.to_string(),
          language: language.clone(),
        });
      }
    }

    let label_sources = document
      .label_sources
      .get(kind.as_str())
      .cloned()
      .unwrap_or_default();
    if label_sources.is_empty() {
      warn!(%kind, "no label sources configured; entities get no labels");
    }

    debug!(
      %kind,
      categories = document.categories.len(),
      languages = document.languages.len(),
      "mapping table loaded"
    );

    Ok(Self {
      kind,
      languages: document.languages,
      categories: document.categories,
      country_names: document.country_names,
      label_sources,
      descriptions,
      ignored_names: document
        .ignored_names
        .iter()
        .map(|n| n.to_lowercase())
        .collect(),
      temporal_properties: document.temporal_properties,
    })
  }

  pub fn kind(&self) -> ImportKind { self.kind }

  /// Languages terms may be written in, in configured order.
  pub fn languages(&self) -> &[String] { &self.languages }

  pub fn is_language_configured(&self, language: &str) -> bool {
    self.languages.iter().any(|l| l == language)
  }

  pub fn label_sources(&self) -> &[LabelSource] { &self.label_sources }

  pub fn temporal_properties(&self) -> &BTreeSet<PropertyId> {
    &self.temporal_properties
  }

  /// True if `name` is a placeholder that must not become a label.
  pub fn is_ignored_name(&self, name: &str) -> bool {
    let name = name.to_lowercase();
    self.ignored_names.iter().any(|n| *n == name)
  }

  /// The raw identifier mapped to `code` in `category`.
  ///
  /// Lookup is exact and case-sensitive.
  pub fn resolve(
    &self,
    category: &str,
    code: &str,
  ) -> Result<&str, RecordError> {
    self
      .categories
      .get(category)
      .and_then(|codes| codes.get(code))
      .map(String::as_str)
      .ok_or_else(|| RecordError::unmapped(category, code))
  }

  /// Like [`MappingTable::resolve`], interpreted as a statement value.
  pub fn resolve_value(
    &self,
    category: &str,
    code: &str,
  ) -> Result<Value, RecordError> {
    let identifier = self.resolve(category, code)?;
    Value::from_mapped(identifier)
      .map_err(|_| RecordError::unmapped(category, code))
  }

  /// Like [`MappingTable::resolve`], for categories that map to items only.
  pub fn resolve_item(
    &self,
    category: &str,
    code: &str,
  ) -> Result<EntityId, RecordError> {
    match self.resolve_value(category, code)? {
      Value::Item(id) => Ok(id),
      _ => Err(RecordError::unmapped(category, code)),
    }
  }

  /// True if `code` has a mapping in `category`.
  pub fn contains(&self, category: &str, code: &str) -> bool {
    self.resolve(category, code).is_ok()
  }

  /// The name of country `code` in `language`.
  pub fn country_name(
    &self,
    code: &str,
    language: &str,
  ) -> Result<&str, RecordError> {
    self
      .country_names
      .get(code)
      .and_then(|names| names.get(language))
      .map(String::as_str)
      .ok_or_else(|| RecordError::unmapped(COUNTRY_NAMES, format!("{code}/{language}")))
  }

  /// The description template of `variant` in `language`.
  pub fn description(&self, variant: &str, language: &str) -> Option<&str> {
    self
      .descriptions
      .get(variant)
      .and_then(|texts| texts.get(language))
      .map(String::as_str)
  }
}
