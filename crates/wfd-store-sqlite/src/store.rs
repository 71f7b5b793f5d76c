//! [`SqliteStore`]: the SQLite implementation of the knowledge-base reader
//! and writer.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use wfd_core::{
  claim::{Statement, Terms, Value, value_to_json},
  entity::{EntityId, PropertyId},
  store::{KnowledgeBaseReader, KnowledgeBaseWriter},
};

use crate::{
  Error, Result,
  encode::{
    EncodedStatement, RawStatement, RawTerm, decode_entity, decode_qualifiers,
    decode_references, decode_terms, encode_dt, encode_entity,
    encode_references, encode_statement, encode_terms,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A knowledge-base mirror backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn ensure_entity(&self, entity: EntityId) -> Result<()> {
    let id = encode_entity(entity);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM entities WHERE entity_id = ?1",
              rusqlite::params![id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if exists { Ok(()) } else { Err(Error::EntityNotFound(entity)) }
  }

  /// The stored rows whose property and value match `statement`.
  async fn matching_rows(
    &self,
    entity: EntityId,
    statement: &Statement,
  ) -> Result<Vec<RawStatement>> {
    let id = encode_entity(entity);
    let property = statement.property.to_string();
    let value_json = value_to_json(&statement.value)?;

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT statement_id, property, value_json, qualifiers_json,
                  references_json, provisional
             FROM statements
            WHERE entity_id = ?1 AND property = ?2 AND value_json = ?3
            ORDER BY statement_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id, property, value_json], raw_statement)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

fn raw_statement(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStatement> {
  Ok(RawStatement {
    statement_id:    row.get(0)?,
    property:        row.get(1)?,
    value_json:      row.get(2)?,
    qualifiers_json: row.get(3)?,
    references_json: row.get(4)?,
    provisional:     row.get(5)?,
  })
}

fn insert_statements(
  tx: &rusqlite::Transaction<'_>,
  entity: i64,
  rows: &[EncodedStatement],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO statements (
       entity_id, property, value_json, qualifiers_json, references_json,
       provisional
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
  )?;
  for row in rows {
    stmt.execute(rusqlite::params![
      entity,
      row.property,
      row.value_json,
      row.qualifiers_json,
      row.references_json,
      row.provisional,
    ])?;
  }
  Ok(())
}

fn insert_terms(
  tx: &rusqlite::Transaction<'_>,
  entity: i64,
  rows: &[(&'static str, String, String)],
) -> rusqlite::Result<()> {
  // Existing labels and descriptions win; duplicate aliases are dropped.
  let mut stmt = tx.prepare(
    "INSERT OR IGNORE INTO terms (entity_id, kind, language, value)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (kind, language, value) in rows {
    stmt.execute(rusqlite::params![entity, kind, language, value])?;
  }
  Ok(())
}

// ─── Reader impl ─────────────────────────────────────────────────────────────

impl KnowledgeBaseReader for SqliteStore {
  type Error = Error;

  async fn find_by_identifier(
    &self,
    property: PropertyId,
    code: &str,
  ) -> Result<Vec<EntityId>> {
    let property_str = property.to_string();
    let value_json = value_to_json(&Value::Text(code.to_string()))?;

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT entity_id FROM statements
            WHERE property = ?1 AND value_json = ?2
            ORDER BY entity_id",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![property_str, value_json], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
      })
      .await?;

    Ok(ids.into_iter().map(decode_entity).collect())
  }

  async fn fetch_statements(&self, entity: EntityId) -> Result<Vec<Statement>> {
    let id = encode_entity(entity);

    let raws: Vec<RawStatement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT statement_id, property, value_json, qualifiers_json,
                  references_json, provisional
             FROM statements
            WHERE entity_id = ?1
            ORDER BY statement_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], raw_statement)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatement::into_statement).collect()
  }

  async fn fetch_terms(&self, entity: EntityId) -> Result<Terms> {
    let id = encode_entity(entity);

    let rows: Vec<RawTerm> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT kind, language, value FROM terms
            WHERE entity_id = ?1
            ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok(RawTerm {
              kind:     row.get(0)?,
              language: row.get(1)?,
              value:    row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_terms(rows)
  }
}

// ─── Writer impl ─────────────────────────────────────────────────────────────

impl KnowledgeBaseWriter for SqliteStore {
  type Error = Error;

  async fn create_entity(
    &self,
    terms: &Terms,
    statements: &[Statement],
  ) -> Result<EntityId> {
    let term_rows = encode_terms(terms);
    let statement_rows = statements
      .iter()
      .map(encode_statement)
      .collect::<Result<Vec<_>>>()?;
    let created_at = encode_dt(Utc::now());

    let id: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO entities (created_at) VALUES (?1)",
          rusqlite::params![created_at],
        )?;
        let id = tx.last_insert_rowid();
        insert_terms(&tx, id, &term_rows)?;
        insert_statements(&tx, id, &statement_rows)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    let entity = decode_entity(id);
    debug!(%entity, statements = statements.len(), "entity created");
    Ok(entity)
  }

  async fn add_statements(
    &self,
    entity: EntityId,
    statements: &[Statement],
  ) -> Result<()> {
    self.ensure_entity(entity).await?;
    let id = encode_entity(entity);
    let rows = statements
      .iter()
      .map(encode_statement)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_statements(&tx, id, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_terms(&self, entity: EntityId, terms: &Terms) -> Result<()> {
    self.ensure_entity(entity).await?;
    let id = encode_entity(entity);
    let rows = encode_terms(terms);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_terms(&tx, id, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_references(
    &self,
    entity: EntityId,
    statements: &[Statement],
  ) -> Result<()> {
    self.ensure_entity(entity).await?;

    // Work out the new references_json of every affected row first, then
    // write them in one transaction.
    let mut updates: Vec<(i64, String)> = Vec::new();
    for statement in statements {
      let key = statement.claim_key();
      for raw in self.matching_rows(entity, statement).await? {
        let qualifiers = decode_qualifiers(&raw.qualifiers_json)?;
        let mut stored = Statement::new(statement.property, statement.value.clone());
        stored.qualifiers = qualifiers;
        if stored.claim_key() != key {
          continue;
        }
        stored.references = decode_references(&raw.references_json)?;
        let before = stored.references.len();
        for reference in &statement.references {
          if !stored.is_sourced_by(reference) {
            stored.references.push(reference.clone());
          }
        }
        if stored.references.len() != before {
          updates.push((raw.statement_id, encode_references(&stored.references)?));
        }
      }
    }

    if updates.is_empty() {
      return Ok(());
    }
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "UPDATE statements SET references_json = ?2 WHERE statement_id = ?1",
          )?;
          for (statement_id, references_json) in &updates {
            stmt.execute(rusqlite::params![statement_id, references_json])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
