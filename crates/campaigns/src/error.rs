//! Error types for campaign operations.

use database::DatabaseError;
use thiserror::Error;

/// Errors that fast-fail a campaign operation.
///
/// Per-item failures (a bad lead, a rejected provider call) are never raised
/// as errors; they are reported in the enrollment report instead.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// The target campaign does not exist; a caller configuration error.
    #[error("campaign not found: {0}")]
    CampaignNotFound(String),

    /// Provider credentials are missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider API failed outside any single item.
    #[error("campaign provider error: {0}")]
    Provider(String),

    /// Persistence failed outside the per-chunk isolation.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type for campaign operations.
pub type Result<T> = std::result::Result<T, CampaignError>;
