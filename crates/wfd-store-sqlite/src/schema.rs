//! SQL schema for the knowledge-base mirror.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- entity_id is the numeric part of the Q-identifier.
CREATE TABLE IF NOT EXISTS entities (
    entity_id   INTEGER PRIMARY KEY,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS terms (
    entity_id   INTEGER NOT NULL REFERENCES entities(entity_id),
    kind        TEXT NOT NULL,   -- 'label' | 'description' | 'alias'
    language    TEXT NOT NULL,
    value       TEXT NOT NULL,
    UNIQUE (entity_id, kind, language, value)
);

-- At most one label and one description per language.
CREATE UNIQUE INDEX IF NOT EXISTS terms_single_idx
    ON terms(entity_id, kind, language) WHERE kind != 'alias';

-- Statements are only ever appended to; the one permitted update adds
-- reference blocks to references_json.
CREATE TABLE IF NOT EXISTS statements (
    statement_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id        INTEGER NOT NULL REFERENCES entities(entity_id),
    property         TEXT NOT NULL,              -- 'P<digits>'
    value_json       TEXT NOT NULL,              -- JSON-encoded Value
    qualifiers_json  TEXT NOT NULL DEFAULT '[]',
    references_json  TEXT NOT NULL DEFAULT '[]',
    provisional      INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS statements_entity_idx ON statements(entity_id);
CREATE INDEX IF NOT EXISTS statements_value_idx  ON statements(property, value_json);

PRAGMA user_version = 1;
";
