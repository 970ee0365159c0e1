//! SQL schema for the vquad SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Interned RDF terms. Never updated; deleted only by a full reset.
CREATE TABLE IF NOT EXISTS terms (
    term_id     INTEGER PRIMARY KEY,
    lexical     TEXT NOT NULL,
    kind        TEXT NOT NULL,            -- 'iri' | 'literal' | 'blank_node'
    annotation  TEXT NOT NULL DEFAULT '', -- datatype IRI, '@lang', or ''
    UNIQUE (lexical, kind, annotation)
);

CREATE TABLE IF NOT EXISTS named_graphs (
    graph_id    INTEGER PRIMARY KEY,
    uri         TEXT NOT NULL UNIQUE
);

-- One row per (s, p, o, g) ever added. Only `validity` changes: it grows by
-- one '0'/'1' character per commit, version 0 first.
CREATE TABLE IF NOT EXISTS versioned_quads (
    subject_id   INTEGER NOT NULL REFERENCES terms(term_id),
    predicate_id INTEGER NOT NULL REFERENCES terms(term_id),
    object_id    INTEGER NOT NULL REFERENCES terms(term_id),
    graph_id     INTEGER NOT NULL REFERENCES named_graphs(graph_id),
    validity     TEXT NOT NULL,
    PRIMARY KEY (subject_id, predicate_id, object_id, graph_id)
) WITHOUT ROWID;

-- Append-only. `version` is the row position, starting at 0.
CREATE TABLE IF NOT EXISTS commits (
    version     INTEGER PRIMARY KEY,
    kind        TEXT NOT NULL,            -- 'add' | 'remove' | 'mixed'
    summary     TEXT NOT NULL,
    created_at  TEXT NOT NULL             -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS versioned_quads_validity_idx
    ON versioned_quads(validity);

INSERT OR IGNORE INTO named_graphs (graph_id, uri) VALUES (1, 'default');

PRAGMA user_version = 1;
";

/// Wipes every table and re-registers the default graph.
pub const RESET: &str = "
DELETE FROM versioned_quads;
DELETE FROM commits;
DELETE FROM terms;
DELETE FROM named_graphs;
INSERT INTO named_graphs (graph_id, uri) VALUES (1, 'default');
";
