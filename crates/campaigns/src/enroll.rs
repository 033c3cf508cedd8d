//! Idempotent batched campaign enrollment.
//!
//! Contacts are processed in fixed-size chunks; each chunk's local writes
//! run in one transaction so a persistence failure fails exactly that
//! chunk's ids and later chunks still run. Partial failures are reported
//! per item, never raised.

use futures::future::join_all;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use database::models::Campaign;
use database::{campaign, contact, enrollment, lead, organization};

use crate::error::{CampaignError, Result};
use crate::provider::{CampaignApi, ProviderLead};

/// Contacts per enrollment chunk, bounding payload size and transaction scope.
pub const CHUNK_SIZE: usize = 50;

/// What to enroll: canonical contact ids, or raw lead ids that are resolved
/// first.
#[derive(Debug, Clone)]
pub enum EnrollmentTarget {
    Contacts(Vec<String>),
    Leads(Vec<String>),
}

/// A single id that could not be enrolled, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentFailure {
    pub id: String,
    pub reason: String,
}

/// Aggregate result of an enrollment batch.
#[derive(Debug, Default, Serialize)]
pub struct EnrollmentReport {
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<EnrollmentFailure>,
}

impl EnrollmentReport {
    fn succeed(&mut self) {
        self.success_count += 1;
    }

    fn fail(&mut self, id: impl Into<String>, reason: impl ToString) {
        self.failed_count += 1;
        self.errors.push(EnrollmentFailure {
            id: id.into(),
            reason: reason.to_string(),
        });
    }
}

/// A resolved enrollment item. `source_id` is the caller's id (lead or
/// contact) so provider failures map back to what the caller sent.
struct Enrollee {
    source_id: String,
    contact_id: String,
    payload: Option<ProviderLead>,
}

/// Enroll a batch of leads or contacts in a campaign.
///
/// Fast-fails only when the campaign does not exist or an external campaign
/// has no provider credentials; everything else lands in the report.
pub async fn enroll<A: CampaignApi>(
    pool: &SqlitePool,
    target: EnrollmentTarget,
    campaign_id: &str,
    provider: Option<&A>,
) -> Result<EnrollmentReport> {
    let target_campaign = campaign::get_campaign(pool, campaign_id)
        .await?
        .ok_or_else(|| CampaignError::CampaignNotFound(campaign_id.to_string()))?;

    let dispatch = external_provider(&target_campaign, provider)?;

    let mut report = EnrollmentReport::default();
    let enrollees = resolve_targets(pool, target, dispatch.is_some(), &mut report).await;

    for chunk in enrollees.chunks(CHUNK_SIZE) {
        if let Err(e) = persist_chunk(pool, campaign_id, chunk).await {
            warn!(campaign_id, size = chunk.len(), error = %e, "Enrollment chunk failed");
            for enrollee in chunk {
                report.fail(&*enrollee.source_id, format!("chunk persistence failed: {e}"));
            }
            continue;
        }

        match dispatch {
            Some(api) => dispatch_chunk(api, campaign_id, chunk, &mut report).await,
            None => {
                for _ in chunk {
                    report.succeed();
                }
            }
        }
    }

    info!(
        campaign_id,
        success = report.success_count,
        failed = report.failed_count,
        "Enrollment batch complete"
    );

    Ok(report)
}

/// For an external campaign the provider is mandatory; for a local one it
/// is ignored.
fn external_provider<'a, A: CampaignApi>(
    target_campaign: &Campaign,
    provider: Option<&'a A>,
) -> Result<Option<&'a A>> {
    if !target_campaign.is_external() {
        return Ok(None);
    }

    provider
        .map(Some)
        .ok_or_else(|| {
            CampaignError::Configuration(format!(
                "campaign {} is run by the external provider; \
                 set CAMPAIGN_API_KEY or store per-user settings",
                target_campaign.id
            ))
        })
}

/// Resolve the caller's ids to contacts, collecting per-item failures.
/// Payloads are only built when an external dispatch will need them.
async fn resolve_targets(
    pool: &SqlitePool,
    target: EnrollmentTarget,
    needs_payload: bool,
    report: &mut EnrollmentReport,
) -> Vec<Enrollee> {
    let mut enrollees = Vec::new();

    match target {
        EnrollmentTarget::Leads(ids) => {
            for id in ids {
                match resolve_lead(pool, &id).await {
                    Ok(enrollee) => enrollees.push(enrollee),
                    Err(reason) => report.fail(id, reason),
                }
            }
        }
        EnrollmentTarget::Contacts(ids) if needs_payload => {
            for id in ids {
                match contact_enrollee(pool, &id).await {
                    Ok(enrollee) => enrollees.push(enrollee),
                    Err(reason) => report.fail(id, reason),
                }
            }
        }
        EnrollmentTarget::Contacts(ids) => {
            enrollees.extend(ids.into_iter().map(|id| Enrollee {
                source_id: id.clone(),
                contact_id: id,
                payload: None,
            }));
        }
    }

    enrollees
}

async fn resolve_lead(pool: &SqlitePool, lead_id: &str) -> std::result::Result<Enrollee, String> {
    let target = lead::get_lead(pool, lead_id)
        .await
        .map_err(|e| e.to_string())?;
    let resolution = resolver::resolve(pool, &target)
        .await
        .map_err(|e| e.to_string())?;

    let payload = target.email.as_deref().map(|email| ProviderLead {
        email: database::normalize_email(email),
        first_name: target.first_name.clone(),
        last_name: target.last_name.clone(),
        company: target.company.clone(),
    });

    Ok(Enrollee {
        source_id: lead_id.to_string(),
        contact_id: resolution.contact_id,
        payload,
    })
}

async fn contact_enrollee(
    pool: &SqlitePool,
    contact_id: &str,
) -> std::result::Result<Enrollee, String> {
    let person = contact::get_contact(pool, contact_id)
        .await
        .map_err(|e| e.to_string())?;

    let email = person
        .email
        .clone()
        .ok_or_else(|| "contact has no email address for provider dispatch".to_string())?;

    let company = match person.organization_id.as_deref() {
        Some(org_id) => Some(
            organization::get_organization(pool, org_id)
                .await
                .map_err(|e| e.to_string())?
                .name,
        ),
        None => None,
    };

    let (first_name, last_name) = split_name(&person.name);

    Ok(Enrollee {
        source_id: contact_id.to_string(),
        contact_id: contact_id.to_string(),
        payload: Some(ProviderLead {
            email,
            first_name,
            last_name,
            company,
        }),
    })
}

/// Upsert one chunk's enrollments inside a single transaction.
async fn persist_chunk(
    pool: &SqlitePool,
    campaign_id: &str,
    chunk: &[Enrollee],
) -> database::Result<()> {
    let mut tx = pool.begin().await?;
    for enrollee in chunk {
        enrollment::upsert_enrollment(&mut *tx, campaign_id, &enrollee.contact_id).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Dispatch one chunk to the provider, calls settled in parallel, results
/// mapped back to the originating ids.
async fn dispatch_chunk<A: CampaignApi>(
    api: &A,
    campaign_id: &str,
    chunk: &[Enrollee],
    report: &mut EnrollmentReport,
) {
    let calls = chunk.iter().map(|enrollee| async move {
        match &enrollee.payload {
            Some(payload) => api.add_lead(campaign_id, payload).await,
            None => Err(CampaignError::Configuration(
                "contact has no email address for provider dispatch".to_string(),
            )),
        }
    });

    for (enrollee, result) in chunk.iter().zip(join_all(calls).await) {
        match result {
            Ok(()) => report.succeed(),
            Err(e) => report.fail(&*enrollee.source_id, e),
        }
    }
}

/// Split a display name into the provider's first/last fields.
fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split_whitespace();
    let first = parts.next().map(String::from);
    let rest = parts.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() { None } else { Some(rest) };
    (first, last)
}
