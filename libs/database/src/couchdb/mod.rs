//! CouchDB / Cloudant document store over the HTTP API.

mod config;
mod health;
mod store;
mod wire;

pub use config::{CouchDbConfig, DEFAULT_DATABASE_NAME, IMAGE_NAME_VAR, resolve_database_name};
pub use health::{HealthStatus, check_health_detailed};
pub use store::CouchDbStore;
