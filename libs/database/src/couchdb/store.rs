use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::CouchDbConfig;
use super::wire::{AllDocsResponse, AllDocsRow, BulkDocs, Tombstone, WriteResult};
use crate::common::{DatabaseError, DatabaseResult};
use crate::document::{DeleteTally, Document, DocumentMeta, DocumentStore};

/// Document store backed by the CouchDB HTTP API (CouchDB, Cloudant, PouchDB server).
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct CouchDbStore {
    client: reqwest::Client,
    base_url: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
}

impl CouchDbStore {
    /// Build a store for `config.database`. No request is made until first use.
    pub fn new(config: &CouchDbConfig) -> DatabaseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DatabaseError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(&self.database))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }

    /// Create the database if it does not exist yet.
    ///
    /// Returns `true` when it was created by this call.
    #[instrument(skip(self), fields(database = %self.database))]
    pub async fn ensure_database(&self) -> DatabaseResult<bool> {
        let response = self
            .request(Method::PUT, &self.database_url())
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => {
                info!("Created database");
                Ok(true)
            }
            StatusCode::PRECONDITION_FAILED => {
                debug!("Database already exists");
                Ok(false)
            }
            _ => ensure_success(response).await.map(|_| false),
        }
    }

    /// Non-design rows of `_all_docs`.
    async fn fetch_all_docs(&self, include_docs: bool) -> DatabaseResult<Vec<AllDocsRow>> {
        let url = format!("{}/_all_docs", self.database_url());
        let response = self
            .request(Method::GET, &url)
            .query(&[("include_docs", include_docs)])
            .send()
            .await?;

        let body: AllDocsResponse = ensure_success(response).await?.json().await?;
        Ok(body.rows.into_iter().filter(|row| !row.is_design()).collect())
    }

    /// Send one `_bulk_docs` request and tally the per-document results.
    async fn bulk_delete(&self, docs: Vec<Tombstone>) -> DeleteTally {
        let total = docs.len();
        let url = format!("{}/_bulk_docs", self.database_url());

        let results = async {
            let response = self
                .request(Method::POST, &url)
                .json(&BulkDocs { docs })
                .send()
                .await?;
            let results: Vec<WriteResult> = ensure_success(response).await?.json().await?;
            Ok::<_, DatabaseError>(results)
        }
        .await;

        let results = match results {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, documents = total, "Bulk delete request failed");
                return DeleteTally {
                    succeeded: 0,
                    failed: total,
                };
            }
        };

        let mut tally = DeleteTally::default();
        for result in &results {
            match result.failure() {
                Some(reason) => {
                    warn!(doc_id = ?result.id, reason = %reason, "Failed to delete document");
                    tally.failed += 1;
                }
                None => tally.succeeded += 1,
            }
        }
        // Entries the server did not report on cannot be assumed deleted.
        tally.failed += total.saturating_sub(results.len());
        tally
    }
}

/// Pass 2xx responses through; turn anything else into `UnexpectedResponse`
/// carrying the status and body.
async fn ensure_success(response: Response) -> DatabaseResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "CouchDB request failed");
    Err(DatabaseError::UnexpectedResponse(format!(
        "status {}: {}",
        status, body
    )))
}

#[async_trait]
impl DocumentStore for CouchDbStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    #[instrument(skip(self), fields(database = %self.database))]
    async fn list_all(&self) -> Vec<Document> {
        match self.fetch_all_docs(true).await {
            Ok(rows) => rows.into_iter().filter_map(|row| row.doc).collect(),
            Err(e) => {
                warn!(error = %e, "Unable to retrieve all documents");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self), fields(database = %self.database))]
    async fn count(&self) -> i64 {
        match self.fetch_all_docs(false).await {
            Ok(rows) => rows.len() as i64,
            Err(e) => {
                warn!(error = %e, "Unable to count documents");
                -1
            }
        }
    }

    #[instrument(skip(self, document), fields(database = %self.database))]
    async fn insert(&self, document: Document) -> DatabaseResult<DocumentMeta> {
        let response = self
            .request(Method::POST, &self.database_url())
            .json(&document)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let result: WriteResult = serde_json::from_str(&body).map_err(|e| {
            DatabaseError::UnexpectedResponse(format!("status {}: {} ({})", status, body, e))
        })?;

        if let Some(message) = result.failure() {
            error!(status = %status, error = %message, "Error adding document");
            return Err(DatabaseError::WriteRejected(message));
        }

        match (result.id, result.rev) {
            (Some(id), Some(rev)) => {
                debug!(doc_id = %id, "Document stored");
                Ok(DocumentMeta { id, rev })
            }
            _ => Err(DatabaseError::UnexpectedResponse(format!(
                "status {}: write acknowledged without id/rev",
                status
            ))),
        }
    }

    #[instrument(skip(self), fields(database = %self.database))]
    async fn delete_all(&self) -> DatabaseResult<DeleteTally> {
        let rows = self.fetch_all_docs(false).await.map_err(|e| {
            error!(error = %e, "Unable to enumerate documents for deletion");
            DatabaseError::BulkDeleteFailed(e.to_string())
        })?;

        let docs: Vec<Tombstone> = rows
            .into_iter()
            .filter_map(|row| row.value.map(|value| Tombstone::new(row.id, value.rev)))
            .collect();

        if docs.is_empty() {
            return Ok(DeleteTally::default());
        }

        let tally = self.bulk_delete(docs).await;
        info!(
            succeeded = tally.succeeded,
            failed = tally.failed,
            "Bulk delete finished"
        );
        Ok(tally)
    }

    #[instrument(skip(self))]
    async fn list_databases(&self) -> DatabaseResult<Vec<String>> {
        let url = format!("{}/_all_dbs", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }
}
