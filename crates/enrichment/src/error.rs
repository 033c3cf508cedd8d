//! Error types for enrichment operations.

use database::DatabaseError;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while enriching a lead.
///
/// These never escape [`enrich`](crate::EnrichmentOrchestrator::enrich);
/// they are converted into lead state via [`EnrichmentError::failure_blob`].
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The outbound call exceeded the configured timeout.
    #[error("enrichment request timed out")]
    Timeout,

    /// The provider returned a non-2xx response.
    #[error("provider returned HTTP {code}")]
    Http {
        code: u16,
        /// Best-effort parse of the response body (JSON, else truncated text).
        details: serde_json::Value,
    },

    /// The provider answered 2xx but the payload is unusable. The message
    /// distinguishes "provider said no" from a broken call.
    #[error("{0}")]
    ProviderDataAbsent(String),

    /// Connection-level failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// Persistence failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Serializing the normalized record failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EnrichmentError {
    /// Short type tag recorded alongside the failure.
    pub fn error_type(&self) -> &'static str {
        match self {
            EnrichmentError::Timeout => "timeout",
            EnrichmentError::Http { .. } => "http",
            EnrichmentError::ProviderDataAbsent(_) => "provider_data_absent",
            EnrichmentError::Transport(_) => "transport",
            EnrichmentError::Database(_) => "database",
            EnrichmentError::Serialization(_) => "serialization",
        }
    }

    /// Structured failure blob persisted into `enrichment_data`.
    pub fn failure_blob(&self) -> serde_json::Value {
        let mut blob = json!({
            "error": self.to_string(),
            "error_type": self.error_type(),
            "failed_at": database::now_rfc3339(),
        });

        if let EnrichmentError::Http { code, details } = self {
            blob["error_code"] = json!(code);
            blob["error_details"] = details.clone();
        }

        blob
    }
}

/// Result type for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichmentError>;
