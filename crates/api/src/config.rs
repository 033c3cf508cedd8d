//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use enrichment::EnrichmentConfig;

/// Pipeline service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Enrichment provider configuration; `None` disables enrichment.
    pub enrichment: Option<EnrichmentConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:leadpipe.db?mode=rwc` |
    ///
    /// Enrichment and campaign provider variables are documented on
    /// [`EnrichmentConfig::from_env`] and
    /// [`campaigns::CampaignCredentials::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:leadpipe.db?mode=rwc".to_string());

        Ok(Self {
            addr,
            database_url,
            enrichment: EnrichmentConfig::from_env(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,
}
