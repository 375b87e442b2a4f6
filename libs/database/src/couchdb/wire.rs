//! Response and request bodies of the CouchDB HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /{db}/_all_docs`
#[derive(Debug, Deserialize)]
pub(crate) struct AllDocsResponse {
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub value: Option<RowValue>,
    /// Present only with `include_docs=true`
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RowValue {
    pub rev: String,
}

impl AllDocsRow {
    pub fn is_design(&self) -> bool {
        self.id.starts_with("_design/")
    }
}

/// Result envelope of a single write, also one element of a `_bulk_docs` reply.
///
/// CouchDB reports application errors inside the body (`error`/`reason`), so a
/// transport-level success is not enough to treat the write as accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct WriteResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl WriteResult {
    /// Store message for a failed write, preferring the human-readable reason.
    pub fn failure(&self) -> Option<String> {
        match (&self.error, &self.reason) {
            (Some(error), Some(reason)) => Some(format!("{}: {}", error, reason)),
            (Some(error), None) => Some(error.clone()),
            (None, Some(reason)) => Some(reason.clone()),
            (None, None) => None,
        }
    }
}

/// `POST /{db}/_bulk_docs` body for deletions.
#[derive(Debug, Serialize)]
pub(crate) struct BulkDocs {
    pub docs: Vec<Tombstone>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Tombstone {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
}

impl Tombstone {
    pub fn new(id: String, rev: String) -> Self {
        Self {
            id,
            rev,
            deleted: true,
        }
    }
}
