//! Session management
//!
//! Policy: one live session per account. A login while a session is live
//! fails with `AlreadyLoggedIn`; the caller must log out first. The store
//! backs this with a unique index, so two racing logins cannot both win.
//!
//! [`SessionManager::validate_session`] is the root of every document
//! operation's authorization chain.

use base64::Engine;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::credentials::{valid_password, valid_username};
use crate::error::{ServiceError, ServiceResult, StoreResultExt};
use crate::hasher::PasswordHasher;
use crate::models::{Account, LoginOutcome, LogoutOutcome, Session};
use crate::store::DataStore;

/// Random bytes in a session token
const SESSION_TOKEN_BYTES: usize = 32;

/// Logs accounts in and out and validates presented sessions
pub struct SessionManager<'a> {
    store: &'a dyn DataStore,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> SessionManager<'a> {
    pub fn new(store: &'a dyn DataStore, hasher: &'a dyn PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Log in with a username and password
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<LoginOutcome> {
        // Avoid a lookup if the account could not exist in the first place
        if !valid_username(username) {
            return Err(ServiceError::InvalidUsername);
        }
        if !valid_password(password) {
            return Err(ServiceError::InvalidPassword);
        }

        let account = self
            .store
            .find_account_by_username(username)?
            .ok_or(ServiceError::InvalidUsername)?;

        if !self.hasher.compare(password, &account.password_hash) {
            return Err(ServiceError::InvalidPassword);
        }

        if self.store.find_session_by_account_id(account.id)?.is_some() {
            return Err(ServiceError::AlreadyLoggedIn);
        }

        let session = Session {
            id: generate_session_id()?,
            account_id: account.id,
            created_at: Utc::now(),
        };
        self.store
            .insert_session(&session)
            .or_conflict(|| ServiceError::AlreadyLoggedIn)?;

        info!(account_id = %account.id, "logged in");
        Ok(LoginOutcome {
            account_id: account.id,
            session_id: session.id,
            username: account.username,
            document_count: account.document_count,
        })
    }

    /// End the live session of `account_id`
    pub fn logout(&self, account_id: Uuid) -> ServiceResult<LogoutOutcome> {
        let deleted = self
            .store
            .delete_session_by_account_id(account_id)
            .or_not_found(|| ServiceError::NotSignedIn)?;

        info!(account_id = %account_id, "logged out");
        Ok(LogoutOutcome {
            account_id,
            deleted_session_id: deleted.id,
        })
    }

    /// Resolve a presented session to its account
    ///
    /// An unknown session and a session owned by another account fail
    /// identically.
    pub fn validate_session(&self, session_id: &str, account_id: Uuid) -> ServiceResult<Account> {
        let session = match self.store.find_session_by_id(session_id)? {
            Some(session) if session.account_id == account_id => session,
            _ => {
                debug!(account_id = %account_id, "rejected session");
                return Err(ServiceError::InvalidSession);
            }
        };

        self.store
            .find_account_by_id(session.account_id)?
            .ok_or(ServiceError::InvalidSession)
    }
}

/// 256-bit random token, URL-safe base64 without padding
fn generate_session_id() -> ServiceResult<String> {
    let mut buf = [0u8; SESSION_TOKEN_BYTES];
    getrandom::getrandom(&mut buf).map_err(|e| ServiceError::SessionIssue(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}
