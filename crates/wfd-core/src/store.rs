//! Collaborator traits: knowledge-base access, parsing and preview.
//!
//! The engine depends on these abstractions only. Concrete implementations
//! live in `wfd-store-sqlite` (reader and writer), `wfd-xml` (parser) and
//! `wfd-engine::preview` (renderer).

use std::future::Future;

use crate::{
  claim::{Statement, StatementSet, Terms},
  entity::{EntityId, PropertyId},
  plan::WritePlan,
  record::HarvestedRecord,
};

// ─── Knowledge base ──────────────────────────────────────────────────────────

/// Read access to the target knowledge base.
///
/// Every call may fail; the engine treats a failure as affecting the current
/// record only.
pub trait KnowledgeBaseReader: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All entities carrying `code` under the identifier `property`.
  /// Zero, one, or several ids may come back.
  fn find_by_identifier<'a>(
    &'a self,
    property: PropertyId,
    code: &'a str,
  ) -> impl Future<Output = Result<Vec<EntityId>, Self::Error>> + Send + 'a;

  /// The statements (with references) currently attached to `entity`.
  fn fetch_statements(
    &self,
    entity: EntityId,
  ) -> impl Future<Output = Result<Vec<Statement>, Self::Error>> + Send + '_;

  /// Labels, descriptions and aliases of `entity`.
  fn fetch_terms(
    &self,
    entity: EntityId,
  ) -> impl Future<Output = Result<Terms, Self::Error>> + Send + '_;

  /// Terms and statements together, as the merger consumes them.
  fn fetch_statement_set(
    &self,
    entity: EntityId,
  ) -> impl Future<Output = Result<StatementSet, Self::Error>> + Send + '_ {
    async move {
      let terms = self.fetch_terms(entity).await?;
      let statements = self.fetch_statements(entity).await?;
      Ok(StatementSet { terms, statements })
    }
  }
}

/// Write access to the target knowledge base. All writes are additive.
pub trait KnowledgeBaseWriter: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a new entity with the given terms and statements and return
  /// its freshly assigned id.
  fn create_entity<'a>(
    &'a self,
    terms: &'a Terms,
    statements: &'a [Statement],
  ) -> impl Future<Output = Result<EntityId, Self::Error>> + Send + 'a;

  /// Attach new statements to an existing entity.
  fn add_statements<'a>(
    &'a self,
    entity: EntityId,
    statements: &'a [Statement],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Add labels, descriptions and aliases. Languages that already carry a
  /// label or description are left untouched.
  fn add_terms<'a>(
    &'a self,
    entity: EntityId,
    terms: &'a Terms,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Attach the reference blocks of `statements` to the matching claims
  /// already present on `entity`.
  fn add_references<'a>(
    &'a self,
    entity: EntityId,
    statements: &'a [Statement],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Parsing and preview ─────────────────────────────────────────────────────

/// Turns a source document into harvested records.
///
/// Re-invoking `parse` on the same input yields the same records.
pub trait RecordParser {
  type Error: std::error::Error + Send + Sync + 'static;

  fn parse(&self, input: &[u8]) -> Result<Vec<HarvestedRecord>, Self::Error>;
}

/// Renders a write plan for non-destructive inspection.
pub trait PreviewRenderer {
  fn render(&self, unique_code: &str, plan: &WritePlan) -> String;
}
