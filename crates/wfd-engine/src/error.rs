//! Error types for `wfd-engine`.
//!
//! [`MappingError`] is fatal for the whole run and is raised before any
//! record is touched. [`RecordError`] affects a single record; the run
//! coordinator records it and moves on.

use std::path::PathBuf;

use thiserror::Error;
use wfd_core::{config::ImportKind, entity::EntityId};

#[derive(Debug, Error)]
pub enum MappingError {
  #[error("cannot read mapping file {path:?}: {source}")]
  Load {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("cannot parse mapping document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("required mapping category {0:?} is missing or empty")]
  MissingCategory(String),

  #[error("the mapping document configures no languages")]
  NoLanguages,

  #[error("{kind} description {variant:?} has no text for language {language:?}")]
  MissingDescription {
    kind:     ImportKind,
    variant:  String,
    language: String,
  },

  #[error("mapping {category:?}: code {code:?} maps to invalid identifier {identifier:?}")]
  InvalidIdentifier {
    category:   String,
    code:       String,
    identifier: String,
  },
}

#[derive(Debug, Error)]
pub enum RecordError {
  #[error("the following value for {category:?} is not mapped: {code}")]
  UnmappedCode { category: String, code: String },

  #[error("record has no {0:?} field")]
  MissingField(String),

  #[error("{code} matches several entities: {}", join_ids(.matches))]
  DuplicateEntity {
    code:    String,
    matches: Vec<EntityId>,
  },

  #[error("parent entity {code} does not exist in the knowledge base")]
  UnknownParent { code: String },

  #[error("knowledge-base read failed: {0}")]
  Read(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("knowledge-base write failed: {0}")]
  Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RecordError {
  pub fn unmapped(category: &str, code: impl Into<String>) -> Self {
    Self::UnmappedCode {
      category: category.to_string(),
      code:     code.into(),
    }
  }
}

fn join_ids(ids: &[EntityId]) -> String {
  ids.iter().map(EntityId::to_string).collect::<Vec<_>>().join(", ")
}

pub type Result<T, E = RecordError> = std::result::Result<T, E>;
