//! Store-agnostic document contract.

use crate::common::DatabaseResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A raw JSON document as held by the store, including `_id`/`_rev` metadata
/// once it has been written.
pub type Document = serde_json::Value;

/// Identity assigned by the store to a written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub id: String,
    pub rev: String,
}

/// Outcome of a best-effort bulk delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl DeleteTally {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Raw document CRUD against one database.
///
/// `list_all` and `count` never fail outright: an unreachable store yields an
/// empty listing and a count of `-1` respectively, so "zero documents" and
/// "could not tell" stay distinguishable.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store is bound to.
    fn database_name(&self) -> &str;

    /// Every document in store order; empty when the store is unreachable.
    async fn list_all(&self) -> Vec<Document>;

    /// Number of documents, or `-1` on failure.
    async fn count(&self) -> i64;

    /// Write one document. Fails with `WriteRejected` when the store reports an error.
    async fn insert(&self, document: Document) -> DatabaseResult<DocumentMeta>;

    /// Delete every document. Not atomic; per-document failures are tallied.
    async fn delete_all(&self) -> DatabaseResult<DeleteTally>;

    /// Databases visible to the configured credentials.
    async fn list_databases(&self) -> DatabaseResult<Vec<String>>;
}
