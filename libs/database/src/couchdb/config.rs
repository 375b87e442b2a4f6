#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_first, env_or_default};
use std::fmt;

/// Database used when the deployment does not name one.
///
/// Tests delete everything in whichever database they point at, so deployed
/// services should always run with `K_SERVICE` set.
pub const DEFAULT_DATABASE_NAME: &str = "knative-eventing-db";

/// Environment variable carrying the Knative service (image) name.
pub const IMAGE_NAME_VAR: &str = "K_SERVICE";

/// Picks the database name from the deployment image name, falling back to
/// [`DEFAULT_DATABASE_NAME`] when it is missing or blank.
pub fn resolve_database_name(image_name: Option<&str>) -> String {
    match image_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            tracing::info!(
                default = DEFAULT_DATABASE_NAME,
                "No image name specified for database name, using default"
            );
            DEFAULT_DATABASE_NAME.to_string()
        }
    }
}

/// CouchDB / Cloudant connection settings.
///
/// # Example
///
/// ```ignore
/// use database::couchdb::CouchDbConfig;
///
/// let config = CouchDbConfig::new("http://localhost:5984", "events")
///     .with_credentials("admin", Some("secret".to_string()));
///
/// // From environment variables (requires `config` feature)
/// let config = CouchDbConfig::from_env()?;
/// ```
#[derive(Clone)]
pub struct CouchDbConfig {
    /// Server base URL, e.g. `https://account.cloudant.com`
    pub url: String,

    /// Database holding the documents
    pub database: String,

    /// Basic-auth user; no auth header is sent when absent
    pub username: Option<String>,

    pub password: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl CouchDbConfig {
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl fmt::Debug for CouchDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchDbConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Credentials injected by the platform as one JSON blob (`service_cloudant`).
#[cfg(feature = "config")]
#[derive(Debug, Default, serde::Deserialize)]
struct ServiceBinding {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[cfg(feature = "config")]
impl ServiceBinding {
    fn from_env() -> Self {
        let Ok(raw) = std::env::var("service_cloudant") else {
            return Self::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring malformed service_cloudant binding");
            Self::default()
        })
    }
}

/// Load CouchDB configuration from environment variables.
///
/// Explicit variables win over the platform binding:
/// - `COUCHDB_URL`, then `cloudant_url`, then `service_cloudant.url` (required)
/// - `COUCHDB_USERNAME`, then `cloudant_username`, then `service_cloudant.username`
/// - `COUCHDB_PASSWORD`, then `cloudant_password`, then `service_cloudant.password`
/// - `COUCHDB_TIMEOUT_SECS` (optional, default: 30)
/// - `K_SERVICE` names the database (default: `knative-eventing-db`)
#[cfg(feature = "config")]
impl FromEnv for CouchDbConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let binding = ServiceBinding::from_env();

        let url = env_first(&["COUCHDB_URL", "cloudant_url"])
            .or(binding.url)
            .ok_or_else(|| ConfigError::MissingEnvVar("COUCHDB_URL or cloudant_url".to_string()))?;

        let username = env_first(&["COUCHDB_USERNAME", "cloudant_username"]).or(binding.username);
        let password = env_first(&["COUCHDB_PASSWORD", "cloudant_password"]).or(binding.password);

        let timeout_secs = env_or_default("COUCHDB_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| ConfigError::ParseError {
                key: "COUCHDB_TIMEOUT_SECS".to_string(),
                details: format!("{}", e),
            })?;

        let image_name = std::env::var(IMAGE_NAME_VAR).ok();
        let database = resolve_database_name(image_name.as_deref());

        Ok(Self {
            url,
            database,
            username,
            password,
            timeout_secs,
        })
    }
}
