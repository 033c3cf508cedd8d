//! Route handlers for the pipeline service.

pub mod campaigns;
pub mod health;
pub mod leads;
pub mod webhooks;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Inbound provider webhook (push path)
        .route("/webhooks/campaign", post(webhooks::campaign_event))
        // Lead capture and enrichment
        .route("/api/leads", post(leads::capture))
        .route("/api/leads/:id", get(leads::get_lead))
        .route("/api/leads/:id/activity", get(leads::activity))
        .route("/api/leads/:id/enrich", post(leads::enrich))
        .route("/api/leads/:id/re-enrich", post(leads::re_enrich))
        // Campaigns, enrollment, and pull sync
        .route(
            "/api/campaigns",
            get(campaigns::list).post(campaigns::create),
        )
        .route("/api/campaigns/external", get(campaigns::external))
        .route("/api/campaigns/:id/enroll", post(campaigns::enroll))
        .route("/api/campaigns/:id/sync", post(campaigns::sync))
}
