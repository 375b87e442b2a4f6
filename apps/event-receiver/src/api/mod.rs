//! API routes module

pub mod health;

use axum::Router;
use database::couchdb::CouchDbStore;
use domain_events::EventService;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Event receiver routes plus readiness, merged at the root.
pub fn routes(store: CouchDbStore, environment: BTreeMap<String, String>) -> Router {
    let service = Arc::new(EventService::new(store.clone(), environment));

    domain_events::events_router()
        .with_state(service)
        .merge(health::router(store))
}
