//! Error types for `wfd-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid entity id: {0:?}")]
  InvalidEntityId(String),

  #[error("invalid property id: {0:?}")]
  InvalidPropertyId(String),

  #[error("unknown import kind: {0:?}")]
  UnknownImportKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
