//! Storage error handling
//!
//! Typed errors for store operations. SQLite failures are classified here,
//! once, so callers only ever see "not found", "unique violation" or a
//! genuine database failure.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The targeted record does not exist
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A uniqueness constraint rejected the write
    #[error("Unique constraint violated on {entity}: {details}")]
    UniqueViolation {
        entity: &'static str,
        details: String,
    },

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored row could not be turned back into a model
    #[error("Invalid {entity} row: {details}")]
    InvalidRow {
        entity: &'static str,
        details: String,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    /// Classify a SQLite error raised while working on `entity`
    pub fn from_sqlite(error: rusqlite::Error, entity: &'static str) -> Self {
        match &error {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound { entity },
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation
                    && is_unique_violation(failure.extended_code) =>
            {
                StoreError::UniqueViolation {
                    entity,
                    details: message.clone().unwrap_or_else(|| failure.to_string()),
                }
            }
            _ => StoreError::Database(error),
        }
    }

    /// Check if this error is a missing-record signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error is a uniqueness conflict
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::InvalidRow { .. } => {
                Some("The database holds a malformed record. Inspect it with `folio admin`.")
            }
            _ => None,
        }
    }
}

/// SQLITE_CONSTRAINT_UNIQUE and SQLITE_CONSTRAINT_PRIMARYKEY
fn is_unique_violation(extended_code: i32) -> bool {
    const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
    const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
    extended_code == SQLITE_CONSTRAINT_UNIQUE || extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Attach an entity name to raw rusqlite results
pub(crate) trait SqliteResultExt<T> {
    fn for_entity(self, entity: &'static str) -> StoreResult<T>;
}

impl<T> SqliteResultExt<T> for rusqlite::Result<T> {
    fn for_entity(self, entity: &'static str) -> StoreResult<T> {
        self.map_err(|e| StoreError::from_sqlite(e, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_no_rows_is_not_found() {
        let err = StoreError::from_sqlite(rusqlite::Error::QueryReturnedNoRows, "document");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document not found");
    }

    #[test]
    fn test_unique_violation_classification() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE NOT NULL);")
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')", []).unwrap();

        let err = conn
            .execute("INSERT INTO t (name) VALUES ('a')", [])
            .for_entity("t")
            .unwrap_err();

        assert!(err.is_unique_violation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_null_violation_stays_database_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT NOT NULL);")
            .unwrap();

        let err = conn
            .execute("INSERT INTO t (name) VALUES (NULL)", [])
            .for_entity("t")
            .unwrap_err();

        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_recovery_suggestion() {
        let err = StoreError::CreateDirectory {
            path: PathBuf::from("/nope"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.recovery_suggestion().is_some());
        assert!(err.to_string().contains("/nope"));

        let err = StoreError::NotFound { entity: "session" };
        assert!(err.recovery_suggestion().is_none());
    }
}
