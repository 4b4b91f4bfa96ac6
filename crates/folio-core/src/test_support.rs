//! Shared helpers for unit tests

use std::cell::Cell;

use argon2::Params;
use rusqlite::ffi;
use uuid::Uuid;

use crate::accounts::AccountManager;
use crate::config::Config;
use crate::hasher::Argon2Hasher;
use crate::models::{Account, AccountRef, Document, DocumentSummary, LoginOutcome, Session};
use crate::service::Service;
use crate::sessions::SessionManager;
use crate::storage::{SqliteStore, StoreError, StoreResult};
use crate::store::{DataStore, DocumentUpdate};

/// Argon2id with the cheapest parameters it accepts
pub fn fast_hasher() -> Argon2Hasher {
    Argon2Hasher::with_params(Params::new(8, 1, 1, None).unwrap())
}

/// In-memory store plus a fast hasher
pub struct TestEnv {
    pub store: SqliteStore,
    pub hasher: Argon2Hasher,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            store: SqliteStore::open_in_memory().unwrap(),
            hasher: fast_hasher(),
        }
    }

    pub fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(&self.store, &self.hasher)
    }

    pub fn register_and_login(&self, username: &str, password: &str) -> LoginOutcome {
        AccountManager::new(&self.store, &self.hasher)
            .create_account(username, password)
            .unwrap();
        self.sessions().login(username, password).unwrap()
    }
}

/// Service over an in-memory store
pub fn test_service() -> Service<SqliteStore, Argon2Hasher> {
    let env = TestEnv::new();
    Service::new(env.store, env.hasher, Config::default())
}

/// SQLite store with switchable faults
///
/// `fail_counters` makes the document-count updates fail with an I/O error.
/// `skip_title_check` makes the title count report zero, so only the unique
/// index stands between a write and a duplicate title.
pub struct FaultyStore {
    pub inner: SqliteStore,
    pub fail_counters: Cell<bool>,
    pub skip_title_check: Cell<bool>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            fail_counters: Cell::new(false),
            skip_title_check: Cell::new(false),
        }
    }

    fn counter_fault(&self) -> StoreResult<()> {
        if self.fail_counters.get() {
            return Err(StoreError::Database(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_IOERR),
                Some("disk I/O error".to_string()),
            )));
        }
        Ok(())
    }
}

impl DataStore for FaultyStore {
    fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.inner.find_account_by_username(username)
    }

    fn find_account_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        self.inner.find_account_by_id(id)
    }

    fn count_accounts_by_username(&self, username: &str) -> StoreResult<u64> {
        self.inner.count_accounts_by_username(username)
    }

    fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.inner.insert_account(account)
    }

    fn increment_account_document_count(&self, account_id: Uuid) -> StoreResult<()> {
        self.counter_fault()?;
        self.inner.increment_account_document_count(account_id)
    }

    fn decrement_account_document_count(&self, account_id: Uuid) -> StoreResult<()> {
        self.counter_fault()?;
        self.inner.decrement_account_document_count(account_id)
    }

    fn set_account_document_count(&self, account_id: Uuid, count: i64) -> StoreResult<()> {
        self.inner.set_account_document_count(account_id, count)
    }

    fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        self.inner.list_accounts()
    }

    fn find_session_by_id(&self, id: &str) -> StoreResult<Option<Session>> {
        self.inner.find_session_by_id(id)
    }

    fn find_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Option<Session>> {
        self.inner.find_session_by_account_id(account_id)
    }

    fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.inner.insert_session(session)
    }

    fn delete_session_by_account_id(&self, account_id: Uuid) -> StoreResult<Session> {
        self.inner.delete_session_by_account_id(account_id)
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        self.inner.list_sessions()
    }

    fn find_document_by_id(&self, id: Uuid) -> StoreResult<Option<Document>> {
        self.inner.find_document_by_id(id)
    }

    fn find_document_by_owner_and_title(
        &self,
        owner_id: Uuid,
        title: &str,
    ) -> StoreResult<Option<Document>> {
        self.inner.find_document_by_owner_and_title(owner_id, title)
    }

    fn insert_document(&self, document: &Document) -> StoreResult<()> {
        self.inner.insert_document(document)
    }

    fn update_document(&self, id: Uuid, update: &DocumentUpdate) -> StoreResult<()> {
        self.inner.update_document(id, update)
    }

    fn delete_document_by_id(&self, id: Uuid) -> StoreResult<Document> {
        self.inner.delete_document_by_id(id)
    }

    fn count_documents_by_owner_and_title(&self, owner_id: Uuid, title: &str) -> StoreResult<u64> {
        if self.skip_title_check.get() {
            return Ok(0);
        }
        self.inner.count_documents_by_owner_and_title(owner_id, title)
    }

    fn count_documents_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        self.inner.count_documents_by_owner(owner_id)
    }

    fn list_owned_documents(&self, owner_id: Uuid) -> StoreResult<Vec<DocumentSummary>> {
        self.inner.list_owned_documents(owner_id)
    }

    fn list_guest_documents(&self, account_id: Uuid) -> StoreResult<Vec<DocumentSummary>> {
        self.inner.list_guest_documents(account_id)
    }

    fn list_documents(&self) -> StoreResult<Vec<Document>> {
        self.inner.list_documents()
    }

    fn add_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        self.inner.add_guest_edge(document_id, account_id)
    }

    fn remove_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<()> {
        self.inner.remove_guest_edge(document_id, account_id)
    }

    fn count_guest_edge(&self, document_id: Uuid, account_id: Uuid) -> StoreResult<u64> {
        self.inner.count_guest_edge(document_id, account_id)
    }

    fn list_guests(&self, document_id: Uuid) -> StoreResult<Vec<AccountRef>> {
        self.inner.list_guests(document_id)
    }
}
