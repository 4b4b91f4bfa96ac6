//! Account registration
//!
//! Input is validated before any store access or hashing.

use tracing::info;

use crate::credentials::{
    valid_password_chars, valid_password_length, valid_username_chars, valid_username_length,
};
use crate::error::{ServiceError, ServiceResult, StoreResultExt};
use crate::hasher::PasswordHasher;
use crate::models::Account;
use crate::store::DataStore;

/// Creates accounts and owns the calls into the password hasher
pub struct AccountManager<'a> {
    store: &'a dyn DataStore,
    hasher: &'a dyn PasswordHasher,
}

impl<'a> AccountManager<'a> {
    pub fn new(store: &'a dyn DataStore, hasher: &'a dyn PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Register a new account
    ///
    /// Returns the stored record, including its password hash; project it
    /// with [`Account::profile`] before sending it anywhere.
    pub fn create_account(&self, username: &str, password: &str) -> ServiceResult<Account> {
        if !valid_username_length(username) {
            return Err(ServiceError::UsernameInvalid(
                "A username must be 3 to 16 characters long",
            ));
        }
        if !valid_username_chars(username) {
            return Err(ServiceError::UsernameInvalid(
                "A username can only contain letters, numbers, '_', and '.'",
            ));
        }
        if !valid_password_length(password) {
            return Err(ServiceError::PasswordInvalid(
                "A password must be 6 to 127 characters long",
            ));
        }
        if !valid_password_chars(password) {
            return Err(ServiceError::PasswordInvalid(
                "A password can only contain letters, numbers and a select few symbols",
            ));
        }

        if self.store.count_accounts_by_username(username)? > 0 {
            return Err(ServiceError::UsernameTaken(username.to_string()));
        }

        let hash = self.hasher.hash(password)?;
        let account = Account::new(username, hash);

        // A concurrent registration can still win the race to the index
        self.store
            .insert_account(&account)
            .or_conflict(|| ServiceError::UsernameTaken(username.to_string()))?;

        info!(account_id = %account.id, username = %account.username, "registered account");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use crate::test_support::fast_hasher;

    #[test]
    fn test_create_account() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hasher = fast_hasher();
        let accounts = AccountManager::new(&store, &hasher);

        let account = accounts.create_account("alice", "hunter22").unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.document_count, 0);
        assert_ne!(account.password_hash, "hunter22");
        assert!(hasher.compare("hunter22", &account.password_hash));

        let stored = store.find_account_by_username("alice").unwrap().unwrap();
        assert_eq!(stored.id, account.id);
    }

    #[test]
    fn test_second_registration_conflicts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hasher = fast_hasher();
        let accounts = AccountManager::new(&store, &hasher);

        accounts.create_account("alice", "hunter22").unwrap();
        let err = accounts.create_account("alice", "another1").unwrap_err();

        assert!(matches!(err, ServiceError::UsernameTaken(ref name) if name == "alice"));
        assert_eq!(store.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_input_touches_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let hasher = fast_hasher();
        let accounts = AccountManager::new(&store, &hasher);

        assert!(matches!(
            accounts.create_account("al", "hunter22"),
            Err(ServiceError::UsernameInvalid(_))
        ));
        assert!(matches!(
            accounts.create_account("al ice", "hunter22"),
            Err(ServiceError::UsernameInvalid(_))
        ));
        assert!(matches!(
            accounts.create_account("alice", "short"),
            Err(ServiceError::PasswordInvalid(_))
        ));
        assert!(matches!(
            accounts.create_account("alice", "no spaces"),
            Err(ServiceError::PasswordInvalid(_))
        ));

        assert!(store.list_accounts().unwrap().is_empty());
    }
}
