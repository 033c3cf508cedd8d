//! Lead capture, enrichment triggers, and status surfaces.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use database::models::{ActivityLogEntry, Lead};
use database::{activity, lead};
use enrichment::EnrichmentOutcome;

use crate::error::Result;
use crate::state::AppState;

/// Request to capture a new lead.
#[derive(Deserialize)]
pub struct CaptureRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

/// Capture a lead and kick off enrichment in the background.
///
/// The capture response never waits on (or fails because of) enrichment;
/// its result is visible later through the lead's enrichment status.
pub async fn capture(
    State(state): State<AppState>,
    Json(req): Json<CaptureRequest>,
) -> Result<Json<Lead>> {
    let new = Lead::capture(req.email, req.first_name, req.last_name, req.company);
    lead::create_lead(state.db.pool(), &new).await?;

    info!(lead_id = %new.id, "Lead captured");

    let orchestrator = state.enrichment.clone();
    let pool = state.db.pool().clone();
    let lead_id = new.id.clone();
    tokio::spawn(async move {
        orchestrator.enrich(&pool, &lead_id).await;
    });

    Ok(Json(new))
}

/// Fetch a lead, including its enrichment status and data.
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>> {
    let fetched = lead::get_lead(state.db.pool(), &id).await?;
    Ok(Json(fetched))
}

/// List a lead's activity log, newest first.
pub async fn activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ActivityLogEntry>>> {
    // 404 for unknown leads rather than an empty list.
    lead::get_lead(state.db.pool(), &id).await?;
    let entries = activity::list_for_lead(state.db.pool(), &id).await?;
    Ok(Json(entries))
}

/// Explicitly trigger enrichment for a lead.
pub async fn enrich(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EnrichmentOutcome>> {
    lead::get_lead(state.db.pool(), &id).await?;
    let outcome = state.enrichment.enrich(state.db.pool(), &id).await;
    Ok(Json(outcome))
}

/// Explicit re-trigger: the only path out of a terminal enrichment state.
pub async fn re_enrich(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EnrichmentOutcome>> {
    lead::get_lead(state.db.pool(), &id).await?;
    let outcome = state.enrichment.retrigger(state.db.pool(), &id).await;
    Ok(Json(outcome))
}
