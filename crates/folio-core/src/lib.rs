//! Folio Core Library
//!
//! This crate provides the access-control core of folio, a multi-tenant
//! document service: accounts own documents, sessions authenticate
//! requests, and documents can be shared read-only with guest accounts.
//!
//! # Architecture
//!
//! Every document operation runs the same chain:
//!
//! 1. [`SessionManager::validate_session`] proves the caller holds a live session
//! 2. [`AccessResolver::resolve`] computes the caller's [`Privilege`]
//! 3. the operation branches on privilege and only then touches the store
//!
//! # Quick Start
//!
//! ```text
//! let service = Service::open(Config::load()?)?;
//!
//! service.create_account("alice", "hunter22")?;
//! let login = service.login("alice", "hunter22")?;
//! let doc = service.create_document(&login.session_id, login.account_id, "Notes")?;
//! ```
//!
//! # Modules
//!
//! - `service`: Unified entry point wiring store, hasher and managers
//! - `api`: Serializable requests and failures for an outer transport
//! - `credentials`: Pure username/password/title predicates
//! - `accounts`, `sessions`, `access`, `documents`: the managers
//! - `hasher`: Password hashing capability (Argon2id)
//! - `store` / `storage`: Persistence trait and its SQLite implementation
//! - `config`: Application configuration

pub mod access;
pub mod accounts;
pub mod api;
pub mod config;
pub mod credentials;
pub mod documents;
pub mod error;
pub mod hasher;
pub mod models;
pub mod service;
pub mod sessions;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use access::{Access, AccessResolver};
pub use accounts::AccountManager;
pub use api::{ApiFailure, Request};
pub use config::{Config, HasherConfig};
pub use documents::DocumentManager;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use hasher::{Argon2Hasher, HasherError, PasswordHasher};
pub use models::{
    Account, AccountProfile, AccountRef, Document, DocumentAccess, DocumentEntry, DocumentId,
    DocumentSource, DocumentSummary, DocumentTitle, DocumentView, Include, LoginOutcome,
    LogoutOutcome, Privilege, Session,
};
pub use service::Service;
pub use sessions::SessionManager;
pub use storage::{SqliteStore, StoreError, StoreResult};
pub use store::DataStore;
