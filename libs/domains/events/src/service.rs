//! Event service layer

use crate::error::Result;
use crate::models::Event;
use crate::store::EventStore;
use database::{DeleteTally, DocumentStore};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{instrument, warn};

/// Liveness body of `GET /v1`.
pub const STATUS_UP: &str = "{\"status\": \"UP\"}";

const NO_CONNECTION: &str = "No connection available";
const REDACTED: &str = "********";
const SENSITIVE_KEY_PARTS: [&str; 4] = ["PASSWORD", "SECRET", "TOKEN", "CREDENTIAL"];

// CouchDB database names are restricted to this alphabet.
static DATABASE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_$()+/-]").unwrap());

/// Event service: ingest, listing and the diagnostic environment report.
pub struct EventService<D: DocumentStore> {
    store: EventStore<D>,
    environment: BTreeMap<String, String>,
}

impl<D: DocumentStore> EventService<D> {
    /// `environment` is the process environment captured at startup.
    pub fn new(documents: D, environment: BTreeMap<String, String>) -> Self {
        Self {
            store: EventStore::new(documents),
            environment,
        }
    }

    /// Database the events are written to.
    pub fn database_name(&self) -> &str {
        self.store.documents().database_name()
    }

    pub fn get_status(&self) -> &'static str {
        STATUS_UP
    }

    /// Databases visible to the store followed by the environment snapshot.
    #[instrument(skip(self))]
    pub async fn get_environment(&self) -> String {
        let databases = match self.store.documents().list_databases().await {
            Ok(names) => {
                let names: Vec<String> = names
                    .iter()
                    .map(|name| DATABASE_NAME_CHARS.replace_all(name, "").into_owned())
                    .collect();
                format!("Available databases: {}", names.join(", "))
            }
            Err(e) => {
                warn!(error = %e, "Unable to list databases");
                NO_CONNECTION.to_string()
            }
        };

        let dump: Vec<String> = self
            .environment
            .iter()
            .map(|(key, value)| format!("{}={}", key, redact(key, value)))
            .collect();

        format!("{}\nEnvironment:\n{}", databases, dump.join("\n"))
    }

    pub async fn add_event(&self, event: &Event) -> Result<()> {
        self.store.add_event(event).await
    }

    pub async fn get_events(&self) -> Vec<Event> {
        self.store.get_events().await
    }

    pub async fn get_num_events(&self) -> i64 {
        self.store.get_num_events().await
    }

    pub async fn remove_all_events(&self) -> Result<DeleteTally> {
        self.store.remove_all_events().await
    }
}

fn redact<'a>(key: &str, value: &'a str) -> &'a str {
    let key = key.to_ascii_uppercase();
    if SENSITIVE_KEY_PARTS.iter().any(|part| key.contains(part)) {
        REDACTED
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockDocumentStore;
    use database::DatabaseError;

    fn environment() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("PORT".to_string(), "8080".to_string()),
            ("cloudant_password".to_string(), "hunter2".to_string()),
            ("APP_ENV".to_string(), "production".to_string()),
        ])
    }

    #[test]
    fn test_status_is_up() {
        let service = EventService::new(MockDocumentStore::new(), BTreeMap::new());
        assert_eq!(service.get_status(), "{\"status\": \"UP\"}");
    }

    #[tokio::test]
    async fn test_environment_lists_sanitized_databases() {
        let mut documents = MockDocumentStore::new();
        documents.expect_list_databases().returning(|| {
            Ok(vec![
                "_replicator".to_string(),
                "Events DB!".to_string(),
                "knative-eventing-db".to_string(),
            ])
        });

        let service = EventService::new(documents, environment());
        let report = service.get_environment().await;

        assert_eq!(
            report,
            "Available databases: _replicator, vents, knative-eventing-db\n\
             Environment:\n\
             APP_ENV=production\n\
             PORT=8080\n\
             cloudant_password=********"
        );
    }

    #[tokio::test]
    async fn test_environment_without_connection() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_list_databases()
            .returning(|| Err(DatabaseError::StoreUnavailable("refused".to_string())));

        let service = EventService::new(documents, environment());
        let report = service.get_environment().await;

        assert!(report.starts_with("No connection available\nEnvironment:\n"));
        assert!(!report.contains("hunter2"));
    }

    #[test]
    fn test_redact_matches_key_case_insensitively() {
        assert_eq!(redact("COUCHDB_PASSWORD", "x"), REDACTED);
        assert_eq!(redact("api_token", "x"), REDACTED);
        assert_eq!(redact("GOOGLE_APPLICATION_CREDENTIALS", "x"), REDACTED);
        assert_eq!(redact("HOSTNAME", "x"), "x");
    }
}
