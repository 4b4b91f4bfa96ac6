//! Storage layer
//!
//! SQLite persistence behind the [`DataStore`](crate::store::DataStore)
//! trait.
//!
//! ## Architecture
//!
//! - **schema**: Versioned table definitions, including the uniqueness
//!   constraints the service relies on
//! - **sqlite**: One-statement-per-call implementation of the store
//! - **error**: Classification of SQLite failures into store errors

pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteStore;
