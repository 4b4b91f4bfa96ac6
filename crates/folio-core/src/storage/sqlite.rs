//! SQLite-backed store
//!
//! Implements [`DataStore`] over a single `rusqlite` connection. Every
//! trait method is one statement, so each call is atomic on its own.
//! Timestamps are stored as Unix milliseconds and ids as text.
//!
//! ## Tables
//!
//! - `accounts` - Registered accounts and their document counters
//! - `sessions` - Live sessions, at most one per account
//! - `documents` - Documents, titles unique per owner
//! - `document_guests` - Document-to-guest junction

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Account, AccountRef, Document, DocumentSummary, Session};
use crate::storage::error::{SqliteResultExt, StoreError, StoreResult};
use crate::storage::schema::{init_schema, needs_init};
use crate::store::{DataStore, DocumentUpdate};

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, document_count, created_at";
const SESSION_COLUMNS: &str = "id, account_id, created_at";
const DOCUMENT_COLUMNS: &str = "id, owner_id, title, content, preview, created_at, last_updated";

/// How long a writer waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite implementation of [`DataStore`]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at the configured path
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = config.database_path();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn query_summaries(&self, sql: &str, key: Uuid) -> StoreResult<Vec<DocumentSummary>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![key.to_string()], SummaryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(SummaryRow::into_summary).collect()
    }
}

impl DataStore for SqliteStore {
    // ==================== Accounts ====================

    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE username = ?", ACCOUNT_COLUMNS);
        self.conn
            .query_row(&sql, params![username], AccountRow::from_row)
            .optional()
            .for_entity("account")?
            .map(AccountRow::into_account)
            .transpose()
    }

    fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS);
        self.conn
            .query_row(&sql, params![id.to_string()], AccountRow::from_row)
            .optional()
            .for_entity("account")?
            .map(AccountRow::into_account)
            .transpose()
    }

    fn count_accounts_by_username(&self, username: &str) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM accounts WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .for_entity("account")?;
        Ok(count as u64)
    }

    fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO accounts (id, username, password_hash, document_count, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
                params![
                    account.id.to_string(),
                    account.username,
                    account.password_hash,
                    account.document_count,
                    account.created_at.timestamp_millis(),
                ],
            )
            .for_entity("account")?;
        debug!(account_id = %account.id, "inserted account");
        Ok(())
    }

    fn increment_account_document_count(&self, account_id: Uuid) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET document_count = document_count + 1 WHERE id = ?",
                params![account_id.to_string()],
            )
            .for_entity("account")?;
        expect_changed(changed, "account")
    }

    fn decrement_account_document_count(&self, account_id: Uuid) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET document_count = MAX(document_count - 1, 0) WHERE id = ?",
                params![account_id.to_string()],
            )
            .for_entity("account")?;
        expect_changed(changed, "account")
    }

    fn set_account_document_count(&self, account_id: Uuid, count: i64) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET document_count = ? WHERE id = ?",
                params![count.max(0), account_id.to_string()],
            )
            .for_entity("account")?;
        expect_changed(changed, "account")
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let sql = format!("SELECT {} FROM accounts ORDER BY username", ACCOUNT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], AccountRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AccountRow::into_account).collect()
    }

    // ==================== Sessions ====================

    fn find_session_by_id(&self, id: &str) -> StoreResult<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS);
        self.conn
            .query_row(&sql, params![id], SessionRow::from_row)
            .optional()
            .for_entity("session")?
            .map(SessionRow::into_session)
            .transpose()
    }

    fn find_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE account_id = ?", SESSION_COLUMNS);
        self.conn
            .query_row(&sql, params![account_id.to_string()], SessionRow::from_row)
            .optional()
            .for_entity("session")?
            .map(SessionRow::into_session)
            .transpose()
    }

    fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO sessions (id, account_id, created_at) VALUES (?, ?, ?)",
                params![
                    session.id,
                    session.account_id.to_string(),
                    session.created_at.timestamp_millis(),
                ],
            )
            .for_entity("session")?;
        Ok(())
    }

    fn delete_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Session> {
        let sql = format!(
            "DELETE FROM sessions WHERE account_id = ? RETURNING {}",
            SESSION_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![account_id.to_string()], SessionRow::from_row)
            .for_entity("session")?;
        row.into_session()
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let sql = format!("SELECT {} FROM sessions ORDER BY created_at", SESSION_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], SessionRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    // ==================== Documents ====================

    fn find_document_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        let sql = format!("SELECT {} FROM documents WHERE id = ?", DOCUMENT_COLUMNS);
        self.conn
            .query_row(&sql, params![id.to_string()], DocumentRow::from_row)
            .optional()
            .for_entity("document")?
            .map(DocumentRow::into_document)
            .transpose()
    }

    fn find_document_by_owner_and_title(
        &self,
        owner_id: Uuid,
        title: &str,
    ) -> StoreResult<Option<Document>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE owner_id = ? AND title = ?",
            DOCUMENT_COLUMNS
        );
        self.conn
            .query_row(
                &sql,
                params![owner_id.to_string(), title],
                DocumentRow::from_row,
            )
            .optional()
            .for_entity("document")?
            .map(DocumentRow::into_document)
            .transpose()
    }

    fn insert_document(&self, document: &Document) -> StoreResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO documents (id, owner_id, title, content, preview, created_at, last_updated)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    document.id.to_string(),
                    document.owner_id.to_string(),
                    document.title,
                    document.content,
                    document.preview,
                    document.created_at.timestamp_millis(),
                    document.last_updated.timestamp_millis(),
                ],
            )
            .for_entity("document")?;
        debug!(document_id = %document.id, "inserted document");
        Ok(())
    }

    fn update_document(&self, id: Uuid, update: &DocumentUpdate) -> StoreResult<()> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(ref title) = update.title {
            sets.push("title = ?");
            values.push(Value::Text(title.clone()));
        }
        if let Some(ref content) = update.content {
            sets.push("content = ?");
            values.push(Value::Text(content.clone()));
        }
        if let Some(ref preview) = update.preview {
            sets.push("preview = ?");
            values.push(preview.clone().map(Value::Text).unwrap_or(Value::Null));
        }
        if let Some(at) = update.last_updated {
            sets.push("last_updated = ?");
            values.push(Value::Integer(at.timestamp_millis()));
        }

        if sets.is_empty() {
            return match self.find_document_by_id(id)? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound { entity: "document" }),
            };
        }

        values.push(Value::Text(id.to_string()));
        let sql = format!("UPDATE documents SET {} WHERE id = ?", sets.join(", "));
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values.iter()))
            .for_entity("document")?;
        expect_changed(changed, "document")
    }

    fn delete_document_by_id(&self, id: Uuid) -> StoreResult<Document> {
        let sql = format!(
            "DELETE FROM documents WHERE id = ? RETURNING {}",
            DOCUMENT_COLUMNS
        );
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], DocumentRow::from_row)
            .for_entity("document")?;
        debug!(document_id = %id, "deleted document");
        row.into_document()
    }

    fn count_documents_by_owner_and_title(&self, owner_id: Uuid, title: &str) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE owner_id = ? AND title = ?",
                params![owner_id.to_string(), title],
                |row| row.get(0),
            )
            .for_entity("document")?;
        Ok(count as u64)
    }

    fn count_documents_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE owner_id = ?",
                params![owner_id.to_string()],
                |row| row.get(0),
            )
            .for_entity("document")?;
        Ok(count as u64)
    }

    fn list_owned_documents(&self, owner_id: Uuid) -> StoreResult<Vec<DocumentSummary>> {
        self.query_summaries(
            r#"
            SELECT id, title, last_updated, created_at, preview
            FROM documents
            WHERE owner_id = ?
            ORDER BY last_updated DESC
            "#,
            owner_id,
        )
    }

    fn list_guest_documents(&self, account_id: Uuid) -> StoreResult<Vec<DocumentSummary>> {
        self.query_summaries(
            r#"
            SELECT d.id, d.title, d.last_updated, d.created_at, d.preview
            FROM documents d
            JOIN document_guests g ON d.id = g.document_id
            WHERE g.account_id = ?
            ORDER BY d.last_updated DESC
            "#,
            account_id,
        )
    }

    fn list_documents(&self) -> StoreResult<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents ORDER BY owner_id, title",
            DOCUMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(DocumentRow::into_document).collect()
    }

    // ==================== Guest edges ====================

    fn add_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO document_guests (document_id, account_id) VALUES (?, ?)",
                params![document_id.to_string(), account_id.to_string()],
            )
            .for_entity("guest edge")?;
        Ok(())
    }

    fn remove_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM document_guests WHERE document_id = ? AND account_id = ?",
                params![document_id.to_string(), account_id.to_string()],
            )
            .for_entity("guest edge")?;
        expect_changed(changed, "guest edge")
    }

    fn count_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM document_guests WHERE document_id = ? AND account_id = ?",
                params![document_id.to_string(), account_id.to_string()],
                |row| row.get(0),
            )
            .for_entity("guest edge")?;
        Ok(count as u64)
    }

    fn list_guests(&self, document_id: Uuid) -> StoreResult<Vec<AccountRef>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.username
            FROM accounts a
            JOIN document_guests g ON a.id = g.account_id
            WHERE g.document_id = ?
            ORDER BY a.username ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![document_id.to_string()], |row| {
                let id: String = row.get(0)?;
                let username: String = row.get(1)?;
                Ok((id, username))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, username)| {
                Ok(AccountRef {
                    id: parse_uuid(&id, "account")?,
                    username,
                })
            })
            .collect()
    }
}

// ==================== Internal structs ====================

struct AccountRow {
    id: String,
    username: String,
    password_hash: String,
    document_count: i64,
    created_at: i64,
}

impl AccountRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            document_count: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn into_account(self) -> StoreResult<Account> {
        Ok(Account {
            id: parse_uuid(&self.id, "account")?,
            username: self.username,
            password_hash: self.password_hash,
            document_count: self.document_count,
            created_at: from_millis(self.created_at, "account")?,
        })
    }
}

struct SessionRow {
    id: String,
    account_id: String,
    created_at: i64,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_id: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn into_session(self) -> StoreResult<Session> {
        Ok(Session {
            id: self.id,
            account_id: parse_uuid(&self.account_id, "session")?,
            created_at: from_millis(self.created_at, "session")?,
        })
    }
}

struct DocumentRow {
    id: String,
    owner_id: String,
    title: String,
    content: String,
    preview: Option<String>,
    created_at: i64,
    last_updated: i64,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            preview: row.get(4)?,
            created_at: row.get(5)?,
            last_updated: row.get(6)?,
        })
    }

    fn into_document(self) -> StoreResult<Document> {
        Ok(Document {
            id: parse_uuid(&self.id, "document")?,
            owner_id: parse_uuid(&self.owner_id, "document")?,
            title: self.title,
            content: self.content,
            preview: self.preview,
            created_at: from_millis(self.created_at, "document")?,
            last_updated: from_millis(self.last_updated, "document")?,
        })
    }
}

struct SummaryRow {
    id: String,
    title: String,
    last_updated: i64,
    created_at: i64,
    preview: Option<String>,
}

impl SummaryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            last_updated: row.get(2)?,
            created_at: row.get(3)?,
            preview: row.get(4)?,
        })
    }

    fn into_summary(self) -> StoreResult<DocumentSummary> {
        Ok(DocumentSummary {
            id: parse_uuid(&self.id, "document")?,
            title: self.title,
            last_updated: from_millis(self.last_updated, "document")?,
            created_at: from_millis(self.created_at, "document")?,
            preview: self.preview,
        })
    }
}

// ==================== Helpers ====================

fn parse_uuid(raw: &str, entity: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| StoreError::InvalidRow {
        entity,
        details: format!("invalid UUID '{}': {}", raw, e),
    })
}

fn from_millis(millis: i64, entity: &'static str) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| StoreError::InvalidRow {
        entity,
        details: format!("timestamp out of range: {}", millis),
    })
}

fn expect_changed(changed: usize, entity: &'static str) -> StoreResult<()> {
    if changed == 0 {
        Err(StoreError::NotFound { entity })
    } else {
        Ok(())
    }
}
