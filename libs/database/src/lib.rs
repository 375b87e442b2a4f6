//! Document store library: a store-agnostic [`DocumentStore`] contract, a CouchDB
//! (Cloudant) implementation over its HTTP API and an in-memory implementation.
//!
//! # Features
//!
//! - `couchdb` (default) - CouchDB / Cloudant support via `reqwest`
//! - `config` - `core_config::FromEnv` for [`couchdb::CouchDbConfig`]
//! - `all` - All features
//!
//! # Examples
//!
//! ```ignore
//! use database::couchdb::{CouchDbConfig, CouchDbStore};
//! use database::DocumentStore;
//!
//! let config = CouchDbConfig::new("http://localhost:5984", "events");
//! let store = CouchDbStore::new(&config)?;
//! store.ensure_database().await?;
//!
//! store.insert(serde_json::json!({"hello": "world"})).await?;
//! assert_eq!(store.count().await, 1);
//! ```
//!
//! Failure semantics are part of the contract: listing degrades to empty,
//! counting degrades to `-1`, writes and bulk-delete enumeration propagate.

// Always available modules
pub mod common;
pub mod document;
pub mod memory;

#[cfg(feature = "couchdb")]
pub mod couchdb;

// Re-exports for convenience
pub use common::{DatabaseError, DatabaseResult};
pub use document::{DeleteTally, Document, DocumentMeta, DocumentStore};
pub use memory::InMemoryDocumentStore;
