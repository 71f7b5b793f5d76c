//! Run configuration: the immutable settings of a single import run.

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, entity::CreationPolicy, entity::PropertyId, vocab};

// ─── Import kind ─────────────────────────────────────────────────────────────

/// The type of dataset being imported.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
pub enum ImportKind {
  /// River basin districts (`RBDSUCA` reports).
  #[serde(rename = "RBD", alias = "rbd")]
  Rbd,
  /// Surface water bodies (`SWB` reports).
  #[serde(rename = "SWB", alias = "swb")]
  Swb,
}

impl ImportKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Rbd => "RBD",
      Self::Swb => "SWB",
    }
  }

  /// The record field holding the entity's unique code.
  pub fn code_field(self) -> &'static str {
    match self {
      Self::Rbd => "euRBDCode",
      Self::Swb => "euSurfaceWaterBodyCode",
    }
  }

  /// The property under which the unique code is stored.
  pub fn identifier_property(self) -> PropertyId {
    match self {
      Self::Rbd => vocab::EU_RBD_CODE,
      Self::Swb => vocab::EU_SWB_CODE,
    }
  }
}

impl fmt::Display for ImportKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ImportKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "RBD" => Ok(Self::Rbd),
      "SWB" => Ok(Self::Swb),
      _ => Err(Error::UnknownImportKind(s.to_string())),
    }
  }
}

// ─── Run configuration ───────────────────────────────────────────────────────

/// Where write plans go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
  /// Plans are computed and discarded.
  DryRun,
  /// Plans are rendered to the given file.
  Preview(PathBuf),
  /// Plans are written to the knowledge base.
  Live,
}

/// Settings for one run, deserialised from the layered configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfiguration {
  pub kind:          ImportKind,
  /// Path to a local XML file, or an `http(s)://` URL.
  pub source:        String,
  #[serde(default)]
  pub policy:        CreationPolicy,
  #[serde(default)]
  pub dry_run:       bool,
  #[serde(default)]
  pub preview_path:  Option<PathBuf>,
  /// Maximum number of records dispatched; `None` processes all.
  #[serde(default)]
  pub cutoff:        Option<usize>,
  #[serde(default = "default_mappings_path")]
  pub mappings_path: PathBuf,
  /// Reporting year; dates temporal statements and picks the dataset.
  #[serde(default = "default_year")]
  pub year:          i32,
  /// SQLite knowledge-base mirror used for reads and live writes.
  #[serde(default = "default_store_path")]
  pub store_path:    PathBuf,
}

fn default_mappings_path() -> PathBuf { PathBuf::from("mappings.json") }

fn default_year() -> i32 { 2016 }

fn default_store_path() -> PathBuf { PathBuf::from("wfd.sqlite") }

impl RunConfiguration {
  /// A configuration with every optional setting at its default.
  pub fn new(kind: ImportKind, source: impl Into<String>) -> Self {
    Self {
      kind,
      source: source.into(),
      policy: CreationPolicy::default(),
      dry_run: false,
      preview_path: None,
      cutoff: None,
      mappings_path: default_mappings_path(),
      year: default_year(),
      store_path: default_store_path(),
    }
  }

  /// Preview wins over dry-run; live is used only when neither is set.
  pub fn sink(&self) -> SinkKind {
    match (&self.preview_path, self.dry_run) {
      (Some(path), _) => SinkKind::Preview(path.clone()),
      (None, true) => SinkKind::DryRun,
      (None, false) => SinkKind::Live,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_parses_case_insensitively() {
    assert_eq!("rbd".parse::<ImportKind>().unwrap(), ImportKind::Rbd);
    assert_eq!("SWB".parse::<ImportKind>().unwrap(), ImportKind::Swb);
    assert!("lake".parse::<ImportKind>().is_err());
  }

  #[test]
  fn defaults_fill_missing_fields() {
    let cfg: RunConfiguration =
      serde_json::from_str(r#"{"kind": "SWB", "source": "swb.xml"}"#).unwrap();
    assert_eq!(cfg.kind, ImportKind::Swb);
    assert_eq!(cfg.policy, CreationPolicy::EnrichOnly);
    assert_eq!(cfg.year, 2016);
    assert_eq!(cfg.cutoff, None);
    assert_eq!(cfg.sink(), SinkKind::Live);
  }

  #[test]
  fn preview_takes_precedence_over_dry_run() {
    let mut cfg = RunConfiguration::new(ImportKind::Rbd, "rbd.xml");
    cfg.dry_run = true;
    assert_eq!(cfg.sink(), SinkKind::DryRun);
    cfg.preview_path = Some(PathBuf::from("preview.wiki"));
    assert_eq!(cfg.sink(), SinkKind::Preview(PathBuf::from("preview.wiki")));
  }
}
