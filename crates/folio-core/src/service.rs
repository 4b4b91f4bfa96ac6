//! Service facade
//!
//! Owns the store, the hasher and the configuration, and exposes every
//! operation as a method. Managers are cheap borrowed views built per
//! call, so the facade holds no state of its own between requests.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::access::{Access, AccessResolver};
use crate::accounts::AccountManager;
use crate::api::{ApiFailure, Request};
use crate::config::Config;
use crate::documents::DocumentManager;
use crate::error::ServiceResult;
use crate::hasher::{Argon2Hasher, PasswordHasher};
use crate::models::{
    AccountProfile, AccountRef, Document, DocumentAccess, DocumentEntry, DocumentId,
    DocumentTitle, Include, LoginOutcome, LogoutOutcome, Session,
};
use crate::sessions::SessionManager;
use crate::storage::SqliteStore;
use crate::store::DataStore;

pub struct Service<S, H> {
    store: S,
    hasher: H,
    config: Config,
}

impl Service<SqliteStore, Argon2Hasher> {
    /// Open the configured SQLite database with the configured hasher
    pub fn open(config: Config) -> ServiceResult<Self> {
        let store = SqliteStore::open(&config)?;
        let hasher = Argon2Hasher::from_config(&config.hasher)?;
        Ok(Self::new(store, hasher, config))
    }
}

impl<S: DataStore, H: PasswordHasher> Service<S, H> {
    pub fn new(store: S, hasher: H, config: Config) -> Self {
        Self {
            store,
            hasher,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn accounts(&self) -> AccountManager<'_> {
        AccountManager::new(&self.store, &self.hasher)
    }

    fn sessions(&self) -> SessionManager<'_> {
        SessionManager::new(&self.store, &self.hasher)
    }

    fn documents(&self) -> DocumentManager<'_> {
        DocumentManager::new(
            &self.store,
            self.sessions(),
            self.config.max_content_length,
        )
    }

    // ==================== Accounts and sessions ====================

    pub fn create_account(&self, username: &str, password: &str) -> ServiceResult<AccountProfile> {
        self.accounts()
            .create_account(username, password)
            .map(|account| account.profile())
    }

    pub fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        self.sessions().login(username, password)
    }

    pub fn logout(&self, account_id: Uuid) -> ServiceResult<LogoutOutcome> {
        self.sessions().logout(account_id)
    }

    pub fn validate_session(
        &self,
        session_id: &str,
        account_id: Uuid,
    ) -> ServiceResult<AccountProfile> {
        self.sessions()
            .validate_session(session_id, account_id)
            .map(|account| account.profile())
    }

    pub fn resolve(&self, account_id: Uuid, document_id: Uuid) -> ServiceResult<Access> {
        AccessResolver::new(&self.store).resolve(account_id, document_id)
    }

    // ==================== Documents ====================

    pub fn get_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentAccess> {
        self.documents()
            .get_document(session_id, account_id, document_id)
    }

    pub fn get_documents(
        &self,
        session_id: &str,
        account_id: Uuid,
        include: Include,
    ) -> ServiceResult<Vec<DocumentEntry>> {
        self.documents()
            .get_documents(session_id, account_id, include)
    }

    pub fn create_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        title: &str,
    ) -> ServiceResult<DocumentId> {
        self.documents()
            .create_document(session_id, account_id, title)
    }

    pub fn rename_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        title: &str,
    ) -> ServiceResult<DocumentTitle> {
        self.documents()
            .rename_document(session_id, account_id, document_id, title)
    }

    pub fn delete_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
    ) -> ServiceResult<DocumentTitle> {
        self.documents()
            .delete_document(session_id, account_id, document_id)
    }

    pub fn write_doc_content(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        content: &str,
    ) -> ServiceResult<DocumentId> {
        self.documents()
            .write_doc_content(session_id, account_id, document_id, content)
    }

    pub fn share_document(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: &str,
    ) -> ServiceResult<AccountRef> {
        self.documents()
            .share_document(session_id, account_id, document_id, guest_username)
    }

    pub fn remove_share_access(
        &self,
        session_id: &str,
        account_id: Uuid,
        document_id: Uuid,
        guest_username: &str,
    ) -> ServiceResult<AccountRef> {
        self.documents()
            .remove_share_access(session_id, account_id, document_id, guest_username)
    }

    // ==================== Administration ====================

    pub fn list_accounts(&self) -> ServiceResult<Vec<AccountProfile>> {
        Ok(self
            .store
            .list_accounts()?
            .iter()
            .map(|account| account.profile())
            .collect())
    }

    pub fn list_documents(&self) -> ServiceResult<Vec<Document>> {
        Ok(self.store.list_documents()?)
    }

    pub fn list_sessions(&self) -> ServiceResult<Vec<Session>> {
        Ok(self.store.list_sessions()?)
    }

    pub fn purge_document(&self, username: &str, title: &str) -> ServiceResult<DocumentTitle> {
        self.documents().purge_document(username, title)
    }

    pub fn reconcile_document_counts(&self) -> ServiceResult<Vec<AccountProfile>> {
        Ok(self
            .documents()
            .reconcile_document_counts()?
            .iter()
            .map(|account| account.profile())
            .collect())
    }

    // ==================== Request dispatch ====================

    /// Run one request and encode its outcome
    pub fn handle(&self, request: Request) -> Result<Value, ApiFailure> {
        let op = request.op();
        debug!(op, "handling request");

        match request {
            Request::CreateAccount { username, password } => {
                respond(op, self.create_account(&username, &password))
            }
            Request::Login { username, password } => respond(op, self.login(&username, &password)),
            Request::Logout { account_id } => respond(op, self.logout(account_id)),
            Request::GetDocument {
                session_id,
                account_id,
                document_id,
            } => respond(op, self.get_document(&session_id, account_id, document_id)),
            Request::GetDocuments {
                session_id,
                account_id,
                include,
            } => respond(op, self.get_documents(&session_id, account_id, include)),
            Request::CreateDocument {
                session_id,
                account_id,
                title,
            } => respond(op, self.create_document(&session_id, account_id, &title)),
            Request::RenameDocument {
                session_id,
                account_id,
                document_id,
                title,
            } => respond(
                op,
                self.rename_document(&session_id, account_id, document_id, &title),
            ),
            Request::DeleteDocument {
                session_id,
                account_id,
                document_id,
            } => respond(
                op,
                self.delete_document(&session_id, account_id, document_id),
            ),
            Request::WriteDocContent {
                session_id,
                account_id,
                document_id,
                content,
            } => respond(
                op,
                self.write_doc_content(&session_id, account_id, document_id, &content),
            ),
            Request::ShareDocument {
                session_id,
                account_id,
                document_id,
                guest_username,
            } => respond(
                op,
                self.share_document(&session_id, account_id, document_id, &guest_username),
            ),
            Request::RemoveShareAccess {
                session_id,
                account_id,
                document_id,
                guest_username,
            } => respond(
                op,
                self.remove_share_access(&session_id, account_id, document_id, &guest_username),
            ),
        }
    }

    /// Parse a JSON request body and run it
    pub fn handle_json(&self, body: &str) -> Result<Value, ApiFailure> {
        let request: Request = serde_json::from_str(body).map_err(ApiFailure::malformed)?;
        self.handle(request)
    }
}

fn respond<T: Serialize>(op: &str, result: ServiceResult<T>) -> Result<Value, ApiFailure> {
    match result {
        Ok(payload) => serde_json::to_value(payload).map_err(|e| {
            error!(op, error = %e, "failed to encode response");
            ApiFailure::internal()
        }),
        Err(e) => {
            if e.code() >= 500 {
                error!(op, error = %e, "request failed");
            } else {
                debug!(op, error = %e, "request rejected");
            }
            Err(ApiFailure::from(&e))
        }
    }
}
