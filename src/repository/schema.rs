//! Schema initialization and forward-only migrations.

use rusqlite::{params, Connection};

use crate::models::PII_CATEGORIES;

use super::Result;

/// Bump when adding a migration step below.
const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS pii_categories (
    name TEXT PRIMARY KEY,
    description TEXT NOT NULL DEFAULT '',
    severity_level INTEGER NOT NULL DEFAULT 3
);

CREATE TABLE IF NOT EXISTS batches (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    source_path TEXT NOT NULL,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    total_docs INTEGER NOT NULL DEFAULT 0,
    processed_docs INTEGER NOT NULL DEFAULT 0,
    docs_with_findings INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    batch_id TEXT NOT NULL REFERENCES batches(id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    filepath TEXT NOT NULL,
    page_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    finding_count INTEGER NOT NULL DEFAULT 0,
    processed_at TEXT
);

CREATE TABLE IF NOT EXISTS findings (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    page_number INTEGER NOT NULL,
    pii_type TEXT NOT NULL,
    confidence REAL NOT NULL,
    char_offset INTEGER NOT NULL DEFAULT 0,
    char_length INTEGER NOT NULL DEFAULT 0,
    context_snippet TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_documents_batch_id ON documents(batch_id);
CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
CREATE INDEX IF NOT EXISTS idx_findings_document_id ON findings(document_id);
CREATE INDEX IF NOT EXISTS idx_findings_pii_type ON findings(pii_type);
CREATE INDEX IF NOT EXISTS idx_findings_confidence ON findings(confidence);
"#;

/// Create tables, seed the category reference data and record the
/// schema version. Safe to call on every open.
pub(crate) fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let current: i64 = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap_or(0);

    if current == 0 {
        seed_categories(conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        tracing::info!("initialized schema at version {}", SCHEMA_VERSION);
    } else if current < SCHEMA_VERSION {
        migrate(conn, current)?;
    }

    Ok(())
}

fn seed_categories(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO pii_categories (name, description, severity_level) \
         VALUES (?1, ?2, ?3)",
    )?;
    for cat in PII_CATEGORIES {
        stmt.execute(params![cat.name, cat.description, cat.severity_level])?;
    }
    Ok(())
}

/// Apply migration steps after `from`, in order. Migrations only ever
/// move forward.
fn migrate(conn: &Connection, from: i64) -> Result<()> {
    tracing::info!("migrating schema from version {}", from);
    // No incremental migrations yet; version 1 is the baseline.
    conn.execute(
        "UPDATE schema_version SET version = ?1",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}
