//! Events Domain
//!
//! Receives CloudEvents over HTTP in binary mode, keeps them in a document
//! store and renders them back as plain text for inspection.
//!
//! ```text
//! POST /  ──► binding ──► Event ──► codec ──► DocumentStore (CouchDB)
//!                                                   │
//! GET /v1/events ◄── listing ◄── Event ◄── codec ◄──┘
//! ```

use utoipa::OpenApi;

pub mod binding;
pub mod codec;
mod error;
mod handlers;
mod models;
mod service;
mod store;

pub use error::{EventError, Result};
pub use handlers::{EventsQuery, EventsState, MAX_EVENTS, events_router};
pub use models::{Event, SPEC_VERSION};
pub use service::{EventService, STATUS_UP};
pub use store::EventStore;

/// OpenAPI documentation for the event receiver
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_status,
        handlers::receive_event,
        handlers::get_events,
        handlers::get_environment,
    ),
    components(schemas(axum_helpers::ErrorResponse)),
    tags(
        (name = "events", description = "CloudEvents receiver")
    )
)]
pub struct ApiDoc;
