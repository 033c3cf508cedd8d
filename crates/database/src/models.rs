//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Enrichment state machine for a lead.
///
/// `pending → enriching → {completed | failed}`. Terminal states only go
/// back to `pending` through an explicit re-trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Pending,
    Enriching,
    Completed,
    Failed,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Pending => "pending",
            EnrichmentStatus::Enriching => "enriching",
            EnrichmentStatus::Completed => "completed",
            EnrichmentStatus::Failed => "failed",
        }
    }
}

/// Pipeline-visible lead status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Replied,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Replied => "replied",
        }
    }
}

/// Status of a contact's enrollment in a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Paused,
    Completed,
}

/// Canonical activity types recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    EmailSent,
    EmailOpened,
    EmailClicked,
    EmailReplied,
    EmailBounced,
    EmailUnsubscribed,
    LeadUpdated,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::EmailSent => "email_sent",
            ActivityType::EmailOpened => "email_opened",
            ActivityType::EmailClicked => "email_clicked",
            ActivityType::EmailReplied => "email_replied",
            ActivityType::EmailBounced => "email_bounced",
            ActivityType::EmailUnsubscribed => "email_unsubscribed",
            ActivityType::LeadUpdated => "lead_updated",
        }
    }
}

/// A raw captured lead, prior to canonicalization.
///
/// Owned by the capture flow; the enrichment orchestrator is the only
/// writer after creation. Never deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub status: LeadStatus,
    pub enrichment_status: EnrichmentStatus,
    /// Opaque structured blob from the enrichment provider (JSON text).
    pub enrichment_data: Option<String>,
    pub enrichment_timestamp: Option<String>,
    pub created_at: String,
}

impl Lead {
    /// Build a freshly captured lead with a new id and pending enrichment.
    pub fn capture(
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        company: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            first_name,
            last_name,
            company,
            linkedin_url: None,
            job_title: None,
            status: LeadStatus::New,
            enrichment_status: EnrichmentStatus::Pending,
            enrichment_data: None,
            enrichment_timestamp: None,
            created_at: crate::now_rfc3339(),
        }
    }
}

/// Canonical company record, keyed by normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub name: String,
    /// Lower-cased, trimmed name used as the dedup key.
    pub normalized_name: String,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub size: Option<String>,
    /// Last campaign activity touching a contact of this organization.
    pub last_activity: Option<String>,
    pub updated_at: String,
}

/// Canonical person record, keyed by normalized (lower-cased) email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    pub name: String,
    /// Normalized (lower-cased) email; absent for name-only leads.
    pub email: Option<String>,
    pub organization_id: Option<String>,
    /// Provenance tag identifying which flow created the contact.
    pub source: Option<String>,
    pub created_at: String,
}

/// A local or external campaign. External provider campaigns keep the
/// provider's own id (prefix `cam_`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Prefix used by the external campaign provider for its campaign ids.
pub const EXTERNAL_CAMPAIGN_PREFIX: &str = "cam_";

impl Campaign {
    /// Whether this campaign is run by the external provider.
    pub fn is_external(&self) -> bool {
        self.id.starts_with(EXTERNAL_CAMPAIGN_PREFIX)
    }
}

/// Join row between a campaign and a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CampaignEnrollment {
    pub campaign_id: String,
    pub contact_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: String,
}

/// Immutable, append-only activity event for a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub lead_id: String,
    pub activity_type: ActivityType,
    /// Unix seconds. Integer so the dedup window is plain arithmetic.
    pub occurred_at: i64,
    /// Free-form JSON: source, external campaign id, raw payload.
    pub metadata: Option<String>,
}

/// Per-user campaign provider credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub user_id: String,
    pub campaign_api_url: Option<String>,
    pub campaign_api_key: Option<String>,
    pub updated_at: String,
}
