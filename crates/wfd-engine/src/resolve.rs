//! Entity resolver: unique code → existing entity, new entity, or skip.

use std::collections::HashMap;

use tracing::debug;
use wfd_core::{
  entity::{CreationPolicy, EntityId, PropertyId, Resolution},
  store::KnowledgeBaseReader,
};

use crate::error::{RecordError, Result};

/// Looks entities up by identifier, caching every successful lookup for the
/// rest of the run.
pub struct EntityResolver<'r, R> {
  reader:   &'r R,
  property: PropertyId,
  cache:    HashMap<(PropertyId, String), Vec<EntityId>>,
}

impl<'r, R: KnowledgeBaseReader> EntityResolver<'r, R> {
  /// `property` is the identifier property unique codes are stored under.
  pub fn new(reader: &'r R, property: PropertyId) -> Self {
    Self { reader, property, cache: HashMap::new() }
  }

  /// Decide what a record with `code` should be written to.
  ///
  /// More than one match is an error for the record; nothing is guessed.
  pub async fn resolve(
    &mut self,
    code: &str,
    policy: CreationPolicy,
  ) -> Result<Resolution> {
    let matches = self.lookup(self.property, code).await?;
    match (matches, policy) {
      ([id], _) => Ok(Resolution::Existing(*id)),
      ([], CreationPolicy::AllowCreate) => Ok(Resolution::New),
      ([], CreationPolicy::EnrichOnly) => Ok(Resolution::Skip),
      (many, _) => Err(RecordError::DuplicateEntity {
        code:    code.to_string(),
        matches: many.to_vec(),
      }),
    }
  }

  /// Find the single entity carrying `code` under `property`, without ever
  /// proposing a creation. Used for links to other entities.
  pub async fn resolve_existing(
    &mut self,
    property: PropertyId,
    code: &str,
  ) -> Result<Option<EntityId>> {
    match self.lookup(property, code).await? {
      [] => Ok(None),
      [id] => Ok(Some(*id)),
      many => Err(RecordError::DuplicateEntity {
        code:    code.to_string(),
        matches: many.to_vec(),
      }),
    }
  }

  /// Remember an entity created during this run so later records (and a
  /// repeated code) resolve to it instead of creating a duplicate.
  pub fn record_created(&mut self, code: &str, id: EntityId) {
    self
      .cache
      .insert((self.property, code.to_string()), vec![id]);
  }

  async fn lookup(
    &mut self,
    property: PropertyId,
    code: &str,
  ) -> Result<&[EntityId]> {
    let key = (property, code.to_string());
    if !self.cache.contains_key(&key) {
      // Failed lookups are not cached; a retry may succeed.
      let found = self
        .reader
        .find_by_identifier(property, code)
        .await
        .map_err(|e| RecordError::Read(Box::new(e)))?;
      debug!(%property, code, matches = found.len(), "identifier lookup");
      self.cache.insert(key.clone(), found);
    }
    Ok(self.cache.get(&key).map(Vec::as_slice).unwrap_or_default())
  }
}
