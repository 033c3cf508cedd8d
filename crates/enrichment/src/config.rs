//! Configuration for the enrichment provider.

use std::env;
use std::time::Duration;

/// Default outbound call timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the enrichment webhook.
///
/// Missing configuration is a deployment condition, not an error: the
/// orchestrator degrades to a logged no-op when no config is present.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// URL of the enrichment webhook.
    pub webhook_url: String,

    /// API key sent in the `x-api-key` header.
    pub api_key: String,

    /// Cancellation timeout for the outbound call.
    pub timeout: Duration,
}

impl EnrichmentConfig {
    /// Create a config with the default timeout.
    pub fn new(webhook_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the outbound call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ENRICHMENT_WEBHOOK_URL` | Provider webhook URL | (none; enrichment disabled) |
    /// | `ENRICHMENT_API_KEY` | API key header value | (none; enrichment disabled) |
    /// | `ENRICHMENT_TIMEOUT_SECS` | Outbound call timeout | `60` |
    ///
    /// Returns `None` when either the URL or the key is unset or empty.
    pub fn from_env() -> Option<Self> {
        let webhook_url = env::var("ENRICHMENT_WEBHOOK_URL").ok()?;
        let api_key = env::var("ENRICHMENT_API_KEY").ok()?;

        if webhook_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }

        let timeout_secs = env::var("ENRICHMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(
            Self::new(webhook_url, api_key).with_timeout(Duration::from_secs(timeout_secs)),
        )
    }
}
