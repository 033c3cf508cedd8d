//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use activity_sync::SyncError;
use campaigns::CampaignError;
use database::DatabaseError;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Campaign operation error.
    #[error(transparent)]
    Campaign(#[from] CampaignError),

    /// Sync reconciliation error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Database(DatabaseError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::AlreadyExists { .. }) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Campaign(CampaignError::CampaignNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Campaign(CampaignError::Configuration(_)) => StatusCode::BAD_REQUEST,
            ApiError::Campaign(_) => StatusCode::BAD_GATEWAY,
            ApiError::Sync(SyncError::Provider(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Sync(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let not_found = ApiError::Database(DatabaseError::NotFound {
            entity: "Lead",
            id: "x".to_string(),
        });
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        // Re-registering an existing id is a conflict, not a server fault.
        let exists = ApiError::Database(DatabaseError::AlreadyExists {
            entity: "Campaign",
            id: "q3".to_string(),
        });
        assert_eq!(exists.into_response().status(), StatusCode::CONFLICT);

        let missing_campaign = ApiError::Campaign(CampaignError::CampaignNotFound(
            "cam_x".to_string(),
        ));
        assert_eq!(
            missing_campaign.into_response().status(),
            StatusCode::NOT_FOUND
        );

        let bad = ApiError::BadRequest("either lead_ids or contact_ids".to_string());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::Sync(SyncError::Provider("503".to_string()));
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
