//! Campaign registry, enrollment batches, and pull sync.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use activity_sync::{sync_campaign, SyncReport};
use campaigns::{
    enroll as run_enrollment, CampaignApi, CampaignCredentials, EnrollmentReport,
    EnrollmentTarget, HttpCampaignClient, ProviderCampaign,
};
use database::campaign;
use database::models::Campaign;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Request to register a campaign. Pass the provider's `cam_` id to register
/// an external campaign.
#[derive(Deserialize)]
pub struct CreateCampaignRequest {
    pub id: Option<String>,
    pub name: String,
}

/// Request for an enrollment batch: lead ids or contact ids, not both.
#[derive(Deserialize)]
pub struct EnrollRequest {
    pub lead_ids: Option<Vec<String>>,
    pub contact_ids: Option<Vec<String>>,
    /// Resolves stored campaign provider credentials; environment fallback.
    pub user_id: Option<String>,
}

/// Request for a pull sync.
#[derive(Deserialize, Default)]
pub struct SyncRequest {
    pub user_id: Option<String>,
}

/// List registered campaigns.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>> {
    let campaigns = campaign::list_campaigns(state.db.pool()).await?;
    Ok(Json(campaigns))
}

/// List the external provider's campaigns, for registering their `cam_` ids
/// locally.
pub async fn external(
    State(state): State<AppState>,
    Query(req): Query<SyncRequest>,
) -> Result<Json<Vec<ProviderCampaign>>> {
    let credentials = CampaignCredentials::resolve(state.db.pool(), req.user_id.as_deref()).await?;
    let client = HttpCampaignClient::new(credentials)?;

    let campaigns = client.list_campaigns().await?;
    Ok(Json(campaigns))
}

/// Register a campaign.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<Json<Campaign>> {
    let new = Campaign {
        id: req.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: req.name,
        created_at: database::now_rfc3339(),
    };
    campaign::create_campaign(state.db.pool(), &new).await?;
    Ok(Json(new))
}

/// Run an enrollment batch against a campaign.
pub async fn enroll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EnrollRequest>,
) -> Result<Json<EnrollmentReport>> {
    let target = match (req.lead_ids, req.contact_ids) {
        (Some(lead_ids), None) => EnrollmentTarget::Leads(lead_ids),
        (None, Some(contact_ids)) => EnrollmentTarget::Contacts(contact_ids),
        _ => {
            return Err(ApiError::BadRequest(
                "provide exactly one of lead_ids or contact_ids".to_string(),
            ))
        }
    };

    // Best-effort client; only an external campaign actually requires one,
    // and the batcher reports the missing configuration if so.
    let client = provider_client(&state, req.user_id.as_deref()).await;

    info!(campaign_id = %id, "Enrollment batch requested");
    let report = run_enrollment(state.db.pool(), target, &id, client.as_ref()).await?;

    Ok(Json(report))
}

/// Pull-sync a campaign's provider activity into the local store.
pub async fn sync(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncReport>> {
    let credentials = CampaignCredentials::resolve(state.db.pool(), req.user_id.as_deref()).await?;
    let client = HttpCampaignClient::new(credentials)?;

    info!(campaign_id = %id, "Campaign pull sync requested");
    let report = sync_campaign(state.db.pool(), &client, &id).await?;

    Ok(Json(report))
}

/// Build a provider client when credentials resolve; `None` otherwise.
async fn provider_client(state: &AppState, user_id: Option<&str>) -> Option<HttpCampaignClient> {
    let credentials = CampaignCredentials::resolve(state.db.pool(), user_id)
        .await
        .ok()?;
    HttpCampaignClient::new(credentials).ok()
}
