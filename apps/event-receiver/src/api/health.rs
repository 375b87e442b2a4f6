//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::couchdb::{CouchDbStore, check_health_detailed};
use serde_json::Value;
use tracing::debug;

/// Create the readiness router
pub fn router(store: CouchDbStore) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(store)
}

/// Readiness check - verifies the document store answers
async fn readiness_check(
    State(store): State<CouchDbStore>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "couchdb",
        Box::pin(async move {
            let status = check_health_detailed(&store).await;
            debug!(response_time_ms = status.response_time_ms, "CouchDB readiness probe");
            if status.healthy {
                Ok(())
            } else {
                Err(status.message.unwrap_or_default())
            }
        }),
    )];

    run_health_checks(checks).await
}
