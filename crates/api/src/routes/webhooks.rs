//! Inbound campaign provider webhook (the push path).

use axum::extract::State;
use axum::Json;
use tracing::info;

use activity_sync::{ingest_webhook, SyncOutcome, WebhookEvent};

use crate::error::Result;
use crate::state::AppState;

/// Response for an ingested event.
#[derive(serde::Serialize)]
pub struct WebhookResponse {
    pub outcome: SyncOutcome,
}

/// Accept one provider event. Redeliveries are safe: the reconciler's
/// dedup window absorbs them.
pub async fn campaign_event(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<WebhookResponse>> {
    info!(event_type = %event.event_type, email = %event.email, "Webhook event received");

    let outcome = ingest_webhook(state.db.pool(), &event).await?;

    Ok(Json(WebhookResponse { outcome }))
}
