//! In-memory document store for local development and tests.

use crate::common::{DatabaseError, DatabaseResult};
use crate::document::{DeleteTally, Document, DocumentMeta, DocumentStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Keeps documents in insertion order and mimics CouchDB's `_id`/`_rev` stamping.
///
/// Clones share the same underlying data. [`set_available`](Self::set_available)
/// simulates an unreachable store so degrade paths can be exercised.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    database: String,
    documents: Arc<RwLock<Vec<Document>>>,
    available: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            documents: Arc::new(RwLock::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> DatabaseResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::StoreUnavailable(format!(
                "in-memory database '{}' is offline",
                self.database
            )))
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new("in-memory")
    }
}

fn document_id(document: &Document) -> Option<&str> {
    document.get("_id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn list_all(&self) -> Vec<Document> {
        if let Err(e) = self.ensure_available() {
            tracing::warn!(error = %e, "Unable to retrieve all documents");
            return Vec::new();
        }
        self.documents.read().await.clone()
    }

    async fn count(&self) -> i64 {
        if let Err(e) = self.ensure_available() {
            tracing::warn!(error = %e, "Unable to count documents");
            return -1;
        }
        self.documents.read().await.len() as i64
    }

    async fn insert(&self, document: Document) -> DatabaseResult<DocumentMeta> {
        self.ensure_available()?;

        let Value::Object(mut fields) = document else {
            return Err(DatabaseError::WriteRejected(
                "Document must be a JSON object".to_string(),
            ));
        };

        let mut documents = self.documents.write().await;

        let id = match fields.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        if documents.iter().any(|doc| document_id(doc) == Some(id.as_str())) {
            return Err(DatabaseError::WriteRejected(
                "Document update conflict.".to_string(),
            ));
        }

        let rev = format!("1-{}", Uuid::new_v4().simple());
        fields.insert("_id".to_string(), Value::String(id.clone()));
        fields.insert("_rev".to_string(), Value::String(rev.clone()));
        documents.push(Value::Object(fields));

        tracing::debug!(doc_id = %id, "Stored document in memory");
        Ok(DocumentMeta { id, rev })
    }

    async fn delete_all(&self) -> DatabaseResult<DeleteTally> {
        self.ensure_available()
            .map_err(|e| DatabaseError::BulkDeleteFailed(e.to_string()))?;

        let mut documents = self.documents.write().await;
        let succeeded = documents.len();
        documents.clear();

        Ok(DeleteTally {
            succeeded,
            failed: 0,
        })
    }

    async fn list_databases(&self) -> DatabaseResult<Vec<String>> {
        self.ensure_available()?;
        Ok(vec![self.database.clone()])
    }
}
