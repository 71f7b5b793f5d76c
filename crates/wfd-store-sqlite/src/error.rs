//! Error type for `wfd-store-sqlite`.

use thiserror::Error;
use wfd_core::entity::EntityId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] wfd_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unknown term kind: {0:?}")]
  UnknownTermKind(String),

  #[error("entity not found: {0}")]
  EntityNotFound(EntityId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
