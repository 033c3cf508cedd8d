//! Reconciles provider activity into the local store.
//!
//! Two ingestion paths share one rule set: the inbound webhook (push) and
//! the campaign pull sync. Both dedup against entries of the same type for
//! the same lead within ±60 seconds, so redelivered webhooks and re-run
//! syncs never duplicate history while genuine repeats outside the window
//! are still recorded.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use campaigns::{CampaignApi, ProviderLeadState};
use database::activity::DEDUP_WINDOW_SECS;
use database::models::Lead;
use database::{activity, contact, enrollment, lead, organization};

use crate::error::{Result, SyncError};
use crate::events::{map_event_type, EventMapping};

/// A single event pushed by the provider's webhook.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub email: String,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub is_first: Option<bool>,
    pub timestamp: Option<String>,
}

/// What ingesting one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// A new activity entry was recorded.
    Recorded,
    /// An entry of this type already exists inside the dedup window.
    Duplicate,
    /// The event type has no local mapping; accepted and ignored.
    Unmapped,
    /// No lead matches the event's email.
    Unmatched,
}

/// Aggregate result of a campaign pull sync.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Provider leads inspected.
    pub processed: usize,
    /// Activity entries inserted.
    pub recorded: usize,
    /// Activities skipped by the dedup window.
    pub duplicates: usize,
    /// Provider leads with no matching local lead.
    pub unmatched: usize,
    /// Per-contact failures; the run continues past them.
    pub errors: Vec<SyncFailure>,
}

/// One contact the pull sync could not reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub email: String,
    pub reason: String,
}

/// Ingest one pushed webhook event.
///
/// Redelivery-safe through the dedup window, not through delivery ids.
pub async fn ingest_webhook(pool: &SqlitePool, event: &WebhookEvent) -> Result<SyncOutcome> {
    let Some(matched) = lead::get_lead_by_email(pool, &event.email).await? else {
        warn!(email = %event.email, event_type = %event.event_type, "Webhook event matches no lead");
        return Ok(SyncOutcome::Unmatched);
    };

    let Some(mapping) = map_event_type(&event.event_type) else {
        info!(event_type = %event.event_type, "Unknown webhook event type; ignoring");
        return Ok(SyncOutcome::Unmapped);
    };

    let occurred_at = parse_timestamp(event.timestamp.as_deref());
    let metadata = json!({
        "source": "webhook",
        "campaign_id": event.campaign_id,
        "campaign_name": event.campaign_name,
        "is_first": event.is_first,
    });

    let inserted = apply_event(
        pool,
        &matched,
        &mapping,
        occurred_at,
        metadata,
        event.campaign_id.as_deref(),
    )
    .await?;

    Ok(if inserted {
        SyncOutcome::Recorded
    } else {
        SyncOutcome::Duplicate
    })
}

/// Pull-path sync: fetch every lead in a provider campaign and reconcile
/// its activity flags. Contacts are processed sequentially so failures
/// attribute cleanly; a per-contact error never aborts the run.
pub async fn sync_campaign<A: CampaignApi>(
    pool: &SqlitePool,
    api: &A,
    campaign_id: &str,
) -> Result<SyncReport> {
    let states = api
        .campaign_leads(campaign_id)
        .await
        .map_err(|e| SyncError::Provider(e.to_string()))?;

    let mut report = SyncReport::default();

    for state in states {
        report.processed += 1;
        match sync_lead_state(pool, campaign_id, &state).await {
            Ok(outcome) => {
                report.recorded += outcome.recorded;
                report.duplicates += outcome.duplicates;
                if outcome.unmatched {
                    report.unmatched += 1;
                }
            }
            Err(e) => {
                warn!(email = %state.email, error = %e, "Could not sync contact activity");
                report.errors.push(SyncFailure {
                    email: state.email.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        campaign_id,
        processed = report.processed,
        recorded = report.recorded,
        duplicates = report.duplicates,
        unmatched = report.unmatched,
        "Campaign sync complete"
    );

    Ok(report)
}

#[derive(Default)]
struct LeadSyncOutcome {
    recorded: usize,
    duplicates: usize,
    unmatched: bool,
}

async fn sync_lead_state(
    pool: &SqlitePool,
    campaign_id: &str,
    state: &ProviderLeadState,
) -> Result<LeadSyncOutcome> {
    let mut outcome = LeadSyncOutcome::default();

    let Some(matched) = lead::get_lead_by_email(pool, &state.email).await? else {
        debug!(email = %state.email, "Provider lead matches no local lead");
        outcome.unmatched = true;
        return Ok(outcome);
    };

    // Each flag reuses the push path's mapping table so both paths stay in
    // lockstep.
    let flags = [
        (state.opened, "emailsOpened", state.opened_at.as_deref()),
        (state.clicked, "emailsClicked", state.clicked_at.as_deref()),
        (state.replied, "emailsReplied", state.replied_at.as_deref()),
    ];

    for (set, event_type, at) in flags {
        if !set {
            continue;
        }

        let Some(mapping) = map_event_type(event_type) else {
            continue;
        };
        let metadata = json!({
            "source": "campaign_sync",
            "campaign_id": campaign_id,
        });

        let inserted = apply_event(
            pool,
            &matched,
            &mapping,
            parse_timestamp(at),
            metadata,
            Some(campaign_id),
        )
        .await?;

        if inserted {
            outcome.recorded += 1;
        } else {
            outcome.duplicates += 1;
        }
    }

    Ok(outcome)
}

/// The shared reconciliation rule: dedup-checked insert, guarded lead-status
/// transition, enrollment-status transition, organization activity touch.
async fn apply_event(
    pool: &SqlitePool,
    matched: &Lead,
    mapping: &EventMapping,
    occurred_at: i64,
    metadata: serde_json::Value,
    campaign_id: Option<&str>,
) -> Result<bool> {
    if activity::has_recent(
        pool,
        &matched.id,
        mapping.activity,
        occurred_at,
        DEDUP_WINDOW_SECS,
    )
    .await?
    {
        debug!(
            lead_id = %matched.id,
            activity = mapping.activity.as_str(),
            "Activity inside dedup window; skipping"
        );
        return Ok(false);
    }

    activity::insert_activity(
        pool,
        &matched.id,
        mapping.activity,
        occurred_at,
        Some(&metadata.to_string()),
    )
    .await?;

    if let Some(status) = mapping.lead_status {
        // Conditional: a lead already at this status is left untouched.
        lead::set_status_if_differs(pool, &matched.id, status).await?;
    }

    let linked_contact = match matched.email.as_deref() {
        Some(email) => contact::get_contact_by_email(pool, email).await?,
        None => None,
    };

    if let Some(linked) = &linked_contact {
        if let (Some(status), Some(campaign_id)) = (mapping.enrollment_status, campaign_id) {
            if enrollment::get_enrollment(pool, campaign_id, &linked.id)
                .await?
                .is_some()
            {
                enrollment::set_enrollment_status(pool, campaign_id, &linked.id, status).await?;
            }
        }

        if let Some(org_id) = linked.organization_id.as_deref() {
            organization::touch_last_activity(pool, org_id).await?;
        }
    }

    Ok(true)
}

/// Parse a provider timestamp, falling back to now.
fn parse_timestamp(timestamp: Option<&str>) -> i64 {
    timestamp
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.timestamp())
        .unwrap_or_else(database::now_unix)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use database::models::{
        ActivityType, Campaign, Contact, EnrollmentStatus, Lead, LeadStatus,
    };
    use database::{campaign, Database};

    use campaigns::{CampaignError, ProviderCampaign, ProviderLead};

    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_lead(db: &Database, email: &str) -> Lead {
        let new = Lead::capture(Some(email.to_string()), Some("A".to_string()), None, None);
        lead::create_lead(db.pool(), &new).await.unwrap();
        new
    }

    fn event(event_type: &str, email: &str, timestamp: Option<&str>) -> WebhookEvent {
        WebhookEvent {
            event_type: event_type.to_string(),
            email: email.to_string(),
            campaign_id: None,
            campaign_name: None,
            is_first: None,
            timestamp: timestamp.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_webhook_replied_records_and_transitions() {
        let db = test_db().await;
        let target = seed_lead(&db, "a@b.com").await;

        let outcome = ingest_webhook(
            db.pool(),
            &event("emailsReplied", "a@b.com", Some("2024-06-01T10:00:00Z")),
        )
        .await
        .unwrap();
        assert_eq!(outcome, SyncOutcome::Recorded);

        let fetched = lead::get_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(fetched.status, LeadStatus::Replied);

        let entries = activity::list_for_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].activity_type, ActivityType::EmailReplied);
    }

    #[tokio::test]
    async fn test_redelivery_inside_window_is_deduplicated() {
        let db = test_db().await;
        let target = seed_lead(&db, "a@b.com").await;

        let first = event("emailsOpened", "a@b.com", Some("2024-06-01T10:00:00Z"));
        assert_eq!(
            ingest_webhook(db.pool(), &first).await.unwrap(),
            SyncOutcome::Recorded
        );

        // 10 seconds later: a redelivery.
        let redelivered = event("emailsOpened", "a@b.com", Some("2024-06-01T10:00:10Z"));
        assert_eq!(
            ingest_webhook(db.pool(), &redelivered).await.unwrap(),
            SyncOutcome::Duplicate
        );

        // 90 seconds later: a genuine second open.
        let second = event("emailsOpened", "a@b.com", Some("2024-06-01T10:01:30Z"));
        assert_eq!(
            ingest_webhook(db.pool(), &second).await.unwrap(),
            SyncOutcome::Recorded
        );

        let entries = activity::list_for_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_replied_lead_is_never_downgraded() {
        let db = test_db().await;
        let target = seed_lead(&db, "a@b.com").await;

        ingest_webhook(
            db.pool(),
            &event("emailsReplied", "a@b.com", Some("2024-06-01T10:00:00Z")),
        )
        .await
        .unwrap();

        // A second reply outside the window still records the activity but
        // leaves the status alone.
        let outcome = ingest_webhook(
            db.pool(),
            &event("emailsReplied", "a@b.com", Some("2024-06-01T11:00:00Z")),
        )
        .await
        .unwrap();
        assert_eq!(outcome, SyncOutcome::Recorded);

        let fetched = lead::get_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(fetched.status, LeadStatus::Replied);

        let entries = activity::list_for_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_event_type_is_accepted_unmapped() {
        let db = test_db().await;
        seed_lead(&db, "a@b.com").await;

        let outcome = ingest_webhook(db.pool(), &event("somethingNew", "a@b.com", None))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Unmapped);
    }

    #[tokio::test]
    async fn test_event_for_unknown_email_is_unmatched() {
        let db = test_db().await;

        let outcome = ingest_webhook(db.pool(), &event("emailsOpened", "ghost@b.com", None))
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Unmatched);
    }

    #[tokio::test]
    async fn test_replied_pauses_enrollment_and_touches_org() {
        let db = test_db().await;
        seed_lead(&db, "a@b.com").await;

        let org_id = organization::upsert_organization(
            db.pool(),
            &organization::CompanyAttrs::named("Acme"),
        )
        .await
        .unwrap();
        contact::create_contact(
            db.pool(),
            &Contact {
                id: "c1".to_string(),
                name: "A".to_string(),
                email: Some("a@b.com".to_string()),
                organization_id: Some(org_id.clone()),
                source: None,
                created_at: database::now_rfc3339(),
            },
        )
        .await
        .unwrap();
        campaign::create_campaign(
            db.pool(),
            &Campaign {
                id: "cam_1".to_string(),
                name: "Launch".to_string(),
                created_at: database::now_rfc3339(),
            },
        )
        .await
        .unwrap();
        enrollment::upsert_enrollment(db.pool(), "cam_1", "c1")
            .await
            .unwrap();

        let mut replied = event("emailsReplied", "a@b.com", None);
        replied.campaign_id = Some("cam_1".to_string());
        ingest_webhook(db.pool(), &replied).await.unwrap();

        let updated = enrollment::get_enrollment(db.pool(), "cam_1", "c1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Paused);

        let org = organization::get_organization(db.pool(), &org_id).await.unwrap();
        assert!(org.last_activity.is_some());
    }

    /// Serves a fixed set of lead states.
    struct FixedApi(Vec<ProviderLeadState>);

    #[async_trait]
    impl CampaignApi for FixedApi {
        async fn list_campaigns(
            &self,
        ) -> std::result::Result<Vec<ProviderCampaign>, CampaignError> {
            Ok(Vec::new())
        }

        async fn add_lead(
            &self,
            _campaign_id: &str,
            _lead: &ProviderLead,
        ) -> std::result::Result<(), CampaignError> {
            Ok(())
        }

        async fn campaign_leads(
            &self,
            _campaign_id: &str,
        ) -> std::result::Result<Vec<ProviderLeadState>, CampaignError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_pull_sync_is_rerun_safe() {
        let db = test_db().await;
        let target = seed_lead(&db, "a@b.com").await;

        let api = FixedApi(vec![
            ProviderLeadState {
                email: "a@b.com".to_string(),
                opened: true,
                replied: true,
                opened_at: Some("2024-06-01T10:00:00Z".to_string()),
                replied_at: Some("2024-06-01T11:00:00Z".to_string()),
                ..Default::default()
            },
            ProviderLeadState {
                email: "ghost@b.com".to_string(),
                opened: true,
                ..Default::default()
            },
        ]);

        let first = sync_campaign(db.pool(), &api, "cam_1").await.unwrap();
        assert_eq!(first.processed, 2);
        assert_eq!(first.recorded, 2);
        assert_eq!(first.unmatched, 1);
        assert!(first.errors.is_empty());

        let fetched = lead::get_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(fetched.status, LeadStatus::Replied);

        // Re-running the sync records nothing new.
        let second = sync_campaign(db.pool(), &api, "cam_1").await.unwrap();
        assert_eq!(second.recorded, 0);
        assert_eq!(second.duplicates, 2);

        let entries = activity::list_for_lead(db.pool(), &target.id).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_timestamp_falls_back_to_now() {
        let parsed = parse_timestamp(Some("2024-06-01T10:00:00Z"));
        assert_eq!(parsed, 1_717_236_000);

        let now = database::now_unix();
        assert!(parse_timestamp(Some("not-a-time")) >= now);
        assert!(parse_timestamp(None) >= now);
    }
}
