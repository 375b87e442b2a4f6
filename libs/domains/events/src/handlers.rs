//! HTTP handlers for the event receiver

use crate::binding::{accepts_content_type, from_binary_request};
use crate::error::EventError;
use crate::service::EventService;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_helpers::AppError;
use database::{DeleteTally, DocumentStore};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Maximum number of events rendered by `GET /v1/events`.
pub const MAX_EVENTS: usize = 100;

const NO_EVENTS: &str = "No events found in the database!";
const COUNT_FAILURE: &str = "ERROR: Unable to retrieve number of events due to an unexpected error. See the application logs for details.";
const EVENTS_DELETED: &str =
    "All cloud events deleted. Remove the deleteAll parameter and reload the page.";
const INGEST_FAILURE: &str = "ERROR: Exception processing received event";

/// Events router state
pub type EventsState<D> = Arc<EventService<D>>;

/// Create the event receiver router
pub fn events_router<D: DocumentStore + 'static>() -> Router<EventsState<D>> {
    Router::new()
        .route("/", post(receive_event::<D>))
        .route("/v1", get(get_status::<D>))
        .route("/v1/events", get(get_events::<D>))
        .route("/v1/env", get(get_environment::<D>))
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(default, rename = "deleteAll", deserialize_with = "lenient_bool")]
    pub delete_all: bool,
}

/// Accepts `true/on/yes/1` and `false/off/no/0` in any case. An empty value is `false`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| {
        de::Error::invalid_value(
            Unexpected::Str(&raw),
            &"one of true, false, on, off, yes, no, 1, 0",
        )
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Service status
#[utoipa::path(
    get,
    path = "/v1",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "application/json")
    ),
    tag = "events"
)]
pub async fn get_status<D: DocumentStore>(State(state): State<EventsState<D>>) -> Response {
    ([(CONTENT_TYPE, "application/json")], state.get_status()).into_response()
}

/// Receive a CloudEvent in binary mode
///
/// Attributes travel in `ce-*` headers and the body carries the JSON payload.
/// Requests with a content type other than `application/json` are acknowledged
/// without being stored.
#[utoipa::path(
    post,
    path = "/",
    request_body(content = String, content_type = "application/json", description = "Event data"),
    params(
        ("ce-id" = String, Header, description = "Event id"),
        ("ce-source" = String, Header, description = "Event source"),
        ("ce-type" = String, Header, description = "Event type"),
        ("ce-specversion" = String, Header, description = "CloudEvents version"),
        ("ce-time" = Option<String>, Header, description = "Event time (RFC 3339)"),
    ),
    responses(
        (status = 202, description = "Event accepted"),
        (status = 500, description = "Event could not be processed", body = axum_helpers::ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn receive_event<D: DocumentStore>(
    State(state): State<EventsState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if !accepts_content_type(&headers) {
        debug!("Ignoring request with unsupported content type");
        return Ok(StatusCode::ACCEPTED);
    }

    let event = from_binary_request(&headers, &body).map_err(ingest_failure)?;
    state.add_event(&event).await.map_err(ingest_failure)?;

    info!(
        event_id = %event.id,
        event_type = %event.event_type,
        database = state.database_name(),
        "Event received"
    );
    Ok(StatusCode::ACCEPTED)
}

/// List stored events, or delete all of them
#[utoipa::path(
    get,
    path = "/v1/events",
    params(
        ("deleteAll" = Option<String>, Query, description = "Delete every stored event instead of listing (true/on/yes/1, any case)"),
    ),
    responses(
        (status = 200, description = "Event listing or deletion report", body = String, content_type = "text/plain"),
        (status = 400, description = "deleteAll is not a boolean", body = axum_helpers::ErrorResponse),
        (status = 500, description = "Events could not be counted or retrieved")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_events<D: DocumentStore>(
    State(state): State<EventsState<D>>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if query.delete_all {
        let tally = state.remove_all_events().await.map_err(retrieval_failure)?;
        return Ok((StatusCode::OK, deletion_report(tally)).into_response());
    }

    let count = state.get_num_events().await;
    match count {
        0 => Ok((StatusCode::OK, NO_EVENTS).into_response()),
        n if n < 0 => {
            error!("Unable to count events");
            Ok((StatusCode::INTERNAL_SERVER_ERROR, COUNT_FAILURE).into_response())
        }
        n => {
            let mut body = format!("NUMBER OF EVENTS (MAX {} DISPLAYED): {}\n\n", MAX_EVENTS, n);
            for event in state.get_events().await.iter().take(MAX_EVENTS) {
                let json = serde_json::to_string(event)
                    .map_err(|e| retrieval_failure(EventError::from(e)))?;
                body.push_str(&json);
                body.push_str("\n\n");
            }
            Ok((StatusCode::OK, body).into_response())
        }
    }
}

/// Connected databases and process environment
#[utoipa::path(
    get,
    path = "/v1/env",
    responses(
        (status = 200, description = "Environment report", body = String, content_type = "text/plain")
    ),
    tag = "events"
)]
pub async fn get_environment<D: DocumentStore>(State(state): State<EventsState<D>>) -> String {
    state.get_environment().await
}

fn deletion_report(tally: DeleteTally) -> String {
    if tally.is_complete() {
        return EVENTS_DELETED.to_string();
    }

    warn!(
        failed = tally.failed,
        total = tally.total(),
        "Some events could not be deleted"
    );
    format!(
        "{}\n{} of {} events could not be deleted. See the application logs for details.",
        EVENTS_DELETED,
        tally.failed,
        tally.total()
    )
}

fn ingest_failure(err: EventError) -> AppError {
    error!(error = %err, "Exception processing received event");
    AppError::InternalServerError(INGEST_FAILURE.to_string())
}

fn retrieval_failure(err: EventError) -> AppError {
    error!(error = %err, "Exception while retrieving events");
    AppError::InternalServerError(format!("ERROR: Exception while retrieving events: {}", err))
}
