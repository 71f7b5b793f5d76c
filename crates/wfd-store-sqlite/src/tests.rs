//! Integration tests for `SqliteStore` against an in-memory database.

use wfd_core::{
  claim::{Reference, Snak, Statement, Terms, Value},
  entity::EntityId,
  store::{KnowledgeBaseReader, KnowledgeBaseWriter},
  vocab,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn reference(dataset: u64) -> Reference {
  Reference {
    tested:   vec![Snak::new(vocab::STATED_IN, EntityId::new(dataset))],
    untested: vec![],
  }
}

fn identifier(code: &str) -> Statement {
  Statement::new(vocab::EU_RBD_CODE, Value::Text(code.into()))
    .with_reference(reference(1))
}

fn terms() -> Terms {
  let mut terms = Terms::default();
  terms.labels.insert("en".into(), "Bothnian Sea".into());
  terms.descriptions.insert("en".into(), "river basin district in Sweden".into());
  terms.add_alias("en", "SE2");
  terms
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_entity_reads_back() {
  let s = store().await;
  let statements = vec![
    Statement::new(vocab::INSTANCE_OF, vocab::RIVER_BASIN_DISTRICT)
      .with_reference(reference(1)),
    identifier("SE2"),
  ];

  let id = s.create_entity(&terms(), &statements).await.unwrap();

  assert_eq!(s.fetch_statements(id).await.unwrap(), statements);
  assert_eq!(s.fetch_terms(id).await.unwrap(), terms());
  let set = s.fetch_statement_set(id).await.unwrap();
  assert_eq!(set.statements.len(), 2);
}

#[tokio::test]
async fn entity_ids_are_sequential() {
  let s = store().await;
  let a = s.create_entity(&Terms::default(), &[]).await.unwrap();
  let b = s.create_entity(&Terms::default(), &[]).await.unwrap();
  assert_eq!(b.number(), a.number() + 1);
}

#[tokio::test]
async fn unknown_entity_reads_empty() {
  let s = store().await;
  assert!(s.fetch_statements(EntityId::new(404)).await.unwrap().is_empty());
  assert!(s.fetch_terms(EntityId::new(404)).await.unwrap().is_empty());
}

// ─── Identifier lookup ───────────────────────────────────────────────────────

#[tokio::test]
async fn identifier_lookup_matches_exact_code() {
  let s = store().await;
  let se2 = s.create_entity(&Terms::default(), &[identifier("SE2")]).await.unwrap();
  s.create_entity(&Terms::default(), &[identifier("SE3")]).await.unwrap();

  assert_eq!(
    s.find_by_identifier(vocab::EU_RBD_CODE, "SE2").await.unwrap(),
    vec![se2]
  );
  assert!(
    s.find_by_identifier(vocab::EU_SWB_CODE, "SE2")
      .await
      .unwrap()
      .is_empty()
  );
  assert!(
    s.find_by_identifier(vocab::EU_RBD_CODE, "se2")
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn identifier_lookup_reports_every_match() {
  let s = store().await;
  let a = s.create_entity(&Terms::default(), &[identifier("SE2")]).await.unwrap();
  let b = s.create_entity(&Terms::default(), &[identifier("SE2")]).await.unwrap();
  assert_eq!(
    s.find_by_identifier(vocab::EU_RBD_CODE, "SE2").await.unwrap(),
    vec![a, b]
  );
}

// ─── Additive writes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn statements_are_appended() {
  let s = store().await;
  let id = s.create_entity(&Terms::default(), &[identifier("SE2")]).await.unwrap();
  let mut impact = Statement::new(vocab::SIGNIFICANT_IMPACT, Value::NoValue)
    .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(2016)));
  impact.provisional = true;

  s.add_statements(id, &[impact.clone()]).await.unwrap();

  let stored = s.fetch_statements(id).await.unwrap();
  assert_eq!(stored.len(), 2);
  assert_eq!(stored[1], impact);
}

#[tokio::test]
async fn writes_to_unknown_entity_fail() {
  let s = store().await;
  let err = s
    .add_statements(EntityId::new(404), &[identifier("SE2")])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EntityNotFound(id) if id == EntityId::new(404)));
}

#[tokio::test]
async fn existing_terms_are_kept() {
  let s = store().await;
  let id = s.create_entity(&terms(), &[]).await.unwrap();

  let mut update = Terms::default();
  update.labels.insert("en".into(), "Bottenhavet".into());
  update.labels.insert("sv".into(), "Bottenhavet".into());
  update.add_alias("en", "SE2");
  update.add_alias("en", "Bothnian Sea district");
  s.add_terms(id, &update).await.unwrap();

  let stored = s.fetch_terms(id).await.unwrap();
  assert_eq!(stored.labels["en"], "Bothnian Sea");
  assert_eq!(stored.labels["sv"], "Bottenhavet");
  assert_eq!(stored.aliases["en"], vec![
    "SE2".to_string(),
    "Bothnian Sea district".to_string()
  ]);
}

#[tokio::test]
async fn references_attach_to_matching_claims_only() {
  let s = store().await;
  let dated = Statement::new(vocab::ECOLOGICAL_STATUS, EntityId::new(42))
    .with_qualifier(Snak::new(vocab::POINT_IN_TIME, Value::Year(2016)))
    .with_reference(reference(2));
  let undated = Statement::new(vocab::ECOLOGICAL_STATUS, EntityId::new(42));
  let id = s
    .create_entity(&Terms::default(), &[dated.clone(), undated])
    .await
    .unwrap();

  let mut sourced = dated.clone();
  sourced.references = vec![reference(1)];
  s.add_references(id, &[sourced.clone()]).await.unwrap();
  // Repeating the call does not duplicate the block.
  s.add_references(id, &[sourced]).await.unwrap();

  let stored = s.fetch_statements(id).await.unwrap();
  assert_eq!(stored[0].references, vec![reference(2), reference(1)]);
  assert!(stored[1].references.is_empty());
}

#[tokio::test]
async fn store_persists_across_connections() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("wfd.sqlite");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create_entity(&terms(), &[identifier("SE2")]).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(
    s.find_by_identifier(vocab::EU_RBD_CODE, "SE2").await.unwrap(),
    vec![id]
  );
}
