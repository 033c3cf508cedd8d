//! Error types for activity reconciliation.

use database::DatabaseError;
use thiserror::Error;

/// Errors that abort a reconciliation call.
///
/// A single unmatched or unmapped event is an outcome, not an error; during
/// a pull sync, per-contact failures are collected into the report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Persistence failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The provider fetch for a pull sync failed outright.
    #[error("campaign provider error: {0}")]
    Provider(String),
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, SyncError>;
