//! Persistence interface
//!
//! `DataStore` is the collaborator every manager talks to. Each call is
//! atomic on its own; nothing here promises a transaction across calls.
//!
//! Lookup methods return `Ok(None)` for a missing record. Update and
//! delete methods that match no row fail with [`StoreError::NotFound`],
//! and writes rejected by a uniqueness constraint fail with
//! [`StoreError::UniqueViolation`].
//!
//! [`StoreError::NotFound`]: crate::storage::StoreError::NotFound
//! [`StoreError::UniqueViolation`]: crate::storage::StoreError::UniqueViolation

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, AccountRef, Document, DocumentSummary, Session};
use crate::storage::StoreResult;

/// Fields to change on a document; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` clears the preview
    pub preview: Option<Option<String>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DocumentUpdate {
    /// Only bump `last_updated`
    pub fn touch(at: DateTime<Utc>) -> Self {
        Self {
            last_updated: Some(at),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.preview.is_none()
            && self.last_updated.is_none()
    }
}

/// Synchronous persistence collaborator
pub trait DataStore {
    // ==================== Accounts ====================

    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    fn count_accounts_by_username(&self, username: &str) -> StoreResult<u64>;

    fn insert_account(&self, account: &Account) -> StoreResult<()>;

    fn increment_account_document_count(&self, account_id: Uuid) -> StoreResult<()>;

    /// Never drops the counter below zero
    fn decrement_account_document_count(&self, account_id: Uuid) -> StoreResult<()>;

    fn set_account_document_count(&self, account_id: Uuid, count: i64) -> StoreResult<()>;

    fn list_accounts(&self) -> StoreResult<Vec<Account>>;

    // ==================== Sessions ====================

    fn find_session_by_id(&self, id: &str) -> StoreResult<Option<Session>>;

    fn find_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Option<Session>>;

    fn insert_session(&self, session: &Session) -> StoreResult<()>;

    /// Delete and return the session bound to `account_id`
    fn delete_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Session>;

    fn list_sessions(&self) -> StoreResult<Vec<Session>>;

    // ==================== Documents ====================

    fn find_document_by_id(&self, id: Uuid) -> StoreResult<Option<Document>>;

    fn find_document_by_owner_and_title(
        &self,
        owner_id: Uuid,
        title: &str,
    ) -> StoreResult<Option<Document>>;

    fn insert_document(&self, document: &Document) -> StoreResult<()>;

    fn update_document(&self, id: Uuid, update: &DocumentUpdate) -> StoreResult<()>;

    /// Delete and return the removed document
    fn delete_document_by_id(&self, id: Uuid) -> StoreResult<Document>;

    fn count_documents_by_owner_and_title(&self, owner_id: Uuid, title: &str) -> StoreResult<u64>;

    fn count_documents_by_owner(&self, owner_id: Uuid) -> StoreResult<u64>;

    /// Owned documents, most recently updated first
    fn list_owned_documents(&self, owner_id: Uuid) -> StoreResult<Vec<DocumentSummary>>;

    /// Documents shared with `account_id`, most recently updated first
    fn list_guest_documents(&self, account_id: Uuid) -> StoreResult<Vec<DocumentSummary>>;

    fn list_documents(&self) -> StoreResult<Vec<Document>>;

    // ==================== Guest edges ====================

    fn add_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()>;

    fn remove_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()>;

    fn count_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<u64>;

    /// Guests of a document ordered by username
    fn list_guests(&self, document_id: Uuid) -> StoreResult<Vec<AccountRef>>;
}
