//! Service error handling
//!
//! Every failure an operation can report, each classified into an
//! [`ErrorKind`] that decides its status code. Messages are short and
//! never carry internal identifiers.
//!
//! Store errors are translated where the store is called, through
//! [`StoreResultExt`], so managers never look at SQLite details.

use thiserror::Error;

use crate::hasher::HasherError;
use crate::storage::{StoreError, StoreResult};

/// Broad class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; fixable by the client
    Validation,
    /// Session, document or account absent
    NotFound,
    /// Authenticated but lacking privilege
    AccessDenied,
    /// Title taken, already shared, already logged in
    Conflict,
    /// Unexpected persistence or hashing failure
    StoreFailure,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::AccessDenied => "AccessDeniedError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::StoreFailure => "StoreFailureError",
        }
    }
}

/// Errors returned by folio operations
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid username: {0}")]
    UsernameInvalid(&'static str),

    #[error("Invalid password: {0}")]
    PasswordInvalid(&'static str),

    #[error("Name taken: {0}")]
    UsernameTaken(String),

    /// Login with a malformed or unknown username
    #[error("Invalid username")]
    InvalidUsername,

    /// Login with a malformed or wrong password
    #[error("Invalid password")]
    InvalidPassword,

    #[error("This account is already logged in")]
    AlreadyLoggedIn,

    #[error("Not signed in")]
    NotSignedIn,

    /// Unknown session, or a session bound to another account
    #[error("Invalid session id")]
    InvalidSession,

    #[error("Document not found")]
    DocumentNotFound,

    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid title")]
    InvalidTitle,

    #[error("A document with this title already exists")]
    TitleTaken,

    #[error("File too big: {len} characters (limit {max})")]
    ContentTooLarge { len: usize, max: usize },

    #[error("Illegal username")]
    InvalidGuestUsername,

    #[error("Account '{0}' does not exist")]
    AccountNotFound(String),

    #[error("Cannot share to yourself")]
    SelfShare,

    #[error("Account {0} is already a guest")]
    AlreadyShared(String),

    #[error("Account {0} is not a guest")]
    NotAGuest(String),

    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("Password hashing failure: {0}")]
    Hasher(#[from] HasherError),

    #[error("Could not issue session: {0}")]
    SessionIssue(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        use ServiceError::*;

        match self {
            UsernameInvalid(_) | PasswordInvalid(_) | InvalidUsername | InvalidPassword
            | InvalidTitle | ContentTooLarge { .. } | InvalidGuestUsername | SelfShare => {
                ErrorKind::Validation
            }
            NotSignedIn | InvalidSession | DocumentNotFound | AccountNotFound(_) => {
                ErrorKind::NotFound
            }
            AccessDenied => ErrorKind::AccessDenied,
            UsernameTaken(_) | AlreadyLoggedIn | TitleTaken | AlreadyShared(_) | NotAGuest(_) => {
                ErrorKind::Conflict
            }
            Store(_) | Hasher(_) | SessionIssue(_) => ErrorKind::StoreFailure,
        }
    }

    /// Stable variant name for clients
    pub fn name(&self) -> &'static str {
        use ServiceError::*;

        match self {
            UsernameInvalid(_) => "UsernameInvalid",
            PasswordInvalid(_) => "PasswordInvalid",
            UsernameTaken(_) => "UsernameTaken",
            InvalidUsername => "InvalidUsername",
            InvalidPassword => "InvalidPassword",
            AlreadyLoggedIn => "AlreadyLoggedIn",
            NotSignedIn => "NotSignedIn",
            InvalidSession => "InvalidSession",
            DocumentNotFound => "DocumentNotFound",
            AccessDenied => "AccessDenied",
            InvalidTitle => "InvalidTitle",
            TitleTaken => "TitleTaken",
            ContentTooLarge { .. } => "ContentTooLarge",
            InvalidGuestUsername => "InvalidGuestUsername",
            AccountNotFound(_) => "AccountNotFound",
            SelfShare => "SelfShare",
            AlreadyShared(_) => "AlreadyShared",
            NotAGuest(_) => "NotAGuest",
            Store(_) | Hasher(_) | SessionIssue(_) => "InternalError",
        }
    }

    /// 400 for client-caused failures, 500 otherwise
    pub fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::StoreFailure => 500,
            _ => 400,
        }
    }

    /// Short user-facing title
    pub fn title(&self) -> String {
        match self {
            ServiceError::UsernameInvalid(_) => "Invalid username".to_string(),
            ServiceError::PasswordInvalid(_) => "Invalid password".to_string(),
            ServiceError::ContentTooLarge { .. } => "File too big".to_string(),
            // Internal details stay in the logs
            ServiceError::Store(_) | ServiceError::Hasher(_) | ServiceError::SessionIssue(_) => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Optional longer description
    pub fn description(&self) -> Option<String> {
        match self {
            ServiceError::UsernameInvalid(detail) | ServiceError::PasswordInvalid(detail) => {
                Some(detail.to_string())
            }
            ServiceError::UsernameTaken(username) => {
                Some(format!("The username '{}' already exists", username))
            }
            ServiceError::ContentTooLarge { len, max } => Some(format!(
                "Content is {} characters; the limit is {}",
                len, max
            )),
            ServiceError::AlreadyLoggedIn => {
                Some("Log out of the existing session before logging in again".to_string())
            }
            ServiceError::Store(_) | ServiceError::Hasher(_) | ServiceError::SessionIssue(_) => {
                Some("The request could not be completed. Try again later.".to_string())
            }
            _ => None,
        }
    }
}

/// Result type for folio operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Translate store signals into domain errors at the call site
pub trait StoreResultExt<T> {
    /// Map a missing record to `err`
    fn or_not_found(self, err: impl FnOnce() -> ServiceError) -> ServiceResult<T>;

    /// Map a uniqueness violation to `err`
    fn or_conflict(self, err: impl FnOnce() -> ServiceError) -> ServiceResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn or_not_found(self, err: impl FnOnce() -> ServiceError) -> ServiceResult<T> {
        self.map_err(|e| if e.is_not_found() { err() } else { e.into() })
    }

    fn or_conflict(self, err: impl FnOnce() -> ServiceError) -> ServiceResult<T> {
        self.map_err(|e| {
            if e.is_unique_violation() {
                err()
            } else {
                e.into()
            }
        })
    }
}
