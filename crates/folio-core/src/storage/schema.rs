//! SQLite schema for accounts, sessions, documents and guest edges
//!
//! Uniqueness that the service relies on is also declared here, so the
//! application-level checks are a fast path rather than the only guard:
//! - one session per account (`sessions.account_id`)
//! - one title per owner (`documents(owner_id, title)`)
//! - one guest edge per (document, account)

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Accounts
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            document_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        -- Sessions (at most one per account)
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            account_id TEXT UNIQUE NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
        );

        -- Documents
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            preview TEXT,
            created_at INTEGER NOT NULL,
            last_updated INTEGER NOT NULL,
            UNIQUE (owner_id, title),
            FOREIGN KEY (owner_id) REFERENCES accounts(id) ON DELETE CASCADE
        );

        -- Document-guest junction table (many-to-many)
        CREATE TABLE IF NOT EXISTS document_guests (
            document_id TEXT NOT NULL,
            account_id TEXT NOT NULL,
            PRIMARY KEY (document_id, account_id),
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE,
            FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
        );

        -- Indexes for common query patterns

        -- Owned document listings, newest first
        CREATE INDEX IF NOT EXISTS idx_documents_owner_updated
            ON documents(owner_id, last_updated);

        -- Guest document listings
        CREATE INDEX IF NOT EXISTS idx_document_guests_account
            ON document_guests(account_id);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
