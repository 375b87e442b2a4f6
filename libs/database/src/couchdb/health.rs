use std::time::Instant;

use super::CouchDbStore;
use crate::document::DocumentStore;

/// Health check status for CouchDB
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Check CouchDB connectivity by listing databases, with timing and the failure message.
pub async fn check_health_detailed(store: &CouchDbStore) -> HealthStatus {
    let start = Instant::now();
    let result = store.list_databases().await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}
