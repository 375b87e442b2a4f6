use core_config::{AppInfo, FromEnv, app_info, env_first, env_snapshot, server::ServerConfig};
use database::couchdb::CouchDbConfig;
use std::collections::BTreeMap;

pub use core_config::Environment;

/// Application configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub couchdb: CouchDbConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Comma-separated origins from `CORS_ALLOWED_ORIGIN`; no CORS layer when unset
    pub cors_origins: Option<String>,
    /// Process environment as seen at startup, reported by `GET /v1/env`
    pub env_snapshot: BTreeMap<String, String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let couchdb = CouchDbConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            couchdb,
            server,
            environment,
            cors_origins: env_first(&["CORS_ALLOWED_ORIGIN"]),
            env_snapshot: env_snapshot(),
        })
    }
}
