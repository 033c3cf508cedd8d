//! The enrichment state machine.
//!
//! `enrich` drives a lead through `pending → enriching → {completed | failed}`
//! and never surfaces an error to the caller: every failure is captured as
//! lead state so the capture flow is never blocked by a downstream outage.

use std::time::Duration;

use serde_json::json;
use sqlx::SqlitePool;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use database::models::{ActivityType, Lead};
use database::organization::{self, CompanyAttrs};
use database::{activity, lead};

use crate::config::EnrichmentConfig;
use crate::error::EnrichmentError;
use crate::provider::{EnrichmentProvider, EnrichmentRequest, HttpEnrichmentProvider};
use crate::record::{simplify, EnrichmentRecord};

/// What an enrichment call did. Always returned, never an error.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum EnrichmentOutcome {
    /// No provider configured; nothing happened.
    Disabled,
    /// The lead has no email or name to enrich by; status untouched.
    InsufficientData,
    /// Another call already holds the `enriching` state.
    AlreadyInProgress,
    /// Enrichment completed and was merged into the store.
    Completed { likelihood: Option<f64> },
    /// Enrichment failed; the reason is also persisted on the lead.
    Failed { reason: String },
}

/// Drives leads through the enrichment state machine.
pub struct EnrichmentOrchestrator<P> {
    provider: Option<P>,
    timeout: Duration,
}

impl EnrichmentOrchestrator<HttpEnrichmentProvider> {
    /// Build the production orchestrator. `None` config yields the
    /// deployment-level no-op.
    pub fn from_config(config: Option<EnrichmentConfig>) -> Self {
        match config {
            Some(config) => {
                let call_timeout = config.timeout;
                match HttpEnrichmentProvider::new(config) {
                    Ok(provider) => Self {
                        provider: Some(provider),
                        timeout: call_timeout,
                    },
                    Err(e) => {
                        error!(error = %e, "Failed to build enrichment client; enrichment disabled");
                        Self::disabled()
                    }
                }
            }
            None => Self::disabled(),
        }
    }
}

impl<P: EnrichmentProvider> EnrichmentOrchestrator<P> {
    /// Create an orchestrator with an explicit provider and call timeout.
    pub fn new(provider: P, call_timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout: call_timeout,
        }
    }

    /// Create an orchestrator with no provider; every call is a logged no-op.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Enrich a lead. Returns an outcome, never an error.
    pub async fn enrich(&self, pool: &SqlitePool, lead_id: &str) -> EnrichmentOutcome {
        let Some(provider) = self.provider.as_ref() else {
            debug!(lead_id, "Enrichment not configured; skipping");
            return EnrichmentOutcome::Disabled;
        };

        let target = match lead::get_lead(pool, lead_id).await {
            Ok(target) => target,
            Err(e) => {
                error!(lead_id, error = %e, "Could not load lead for enrichment");
                return EnrichmentOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if target.email.is_none() && target.first_name.is_none() && target.last_name.is_none() {
            debug!(lead_id, "Lead has no identifying fields; skipping enrichment");
            return EnrichmentOutcome::InsufficientData;
        }

        // Conditional transition: a concurrent trigger loses here instead of
        // double-calling the provider.
        match lead::mark_enriching(pool, lead_id).await {
            Ok(true) => {}
            Ok(false) => {
                info!(lead_id, "Enrichment already in progress or in a terminal state");
                return EnrichmentOutcome::AlreadyInProgress;
            }
            Err(e) => {
                error!(lead_id, error = %e, "Could not transition lead to enriching");
                return EnrichmentOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        match self.run(provider, pool, &target).await {
            Ok(record) => {
                info!(lead_id, likelihood = ?record.likelihood, "Enrichment completed");
                EnrichmentOutcome::Completed {
                    likelihood: record.likelihood,
                }
            }
            Err(e) => {
                warn!(lead_id, error = %e, "Enrichment failed; capturing as lead state");
                self.capture_failure(pool, lead_id, &e).await;
                EnrichmentOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Explicit external re-trigger: resets a terminal state to `pending`
    /// before running the normal flow.
    pub async fn retrigger(&self, pool: &SqlitePool, lead_id: &str) -> EnrichmentOutcome {
        match lead::reset_enrichment(pool, lead_id).await {
            Ok(reset) => {
                debug!(lead_id, reset, "Re-trigger requested");
            }
            Err(e) => {
                error!(lead_id, error = %e, "Could not reset enrichment state");
                return EnrichmentOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        self.enrich(pool, lead_id).await
    }

    /// The fallible middle of the flow: provider call, simplification, merge.
    async fn run(
        &self,
        provider: &P,
        pool: &SqlitePool,
        target: &Lead,
    ) -> Result<EnrichmentRecord, EnrichmentError> {
        let request = EnrichmentRequest::from_lead(target);

        // Dropping the lookup future on timeout aborts the HTTP request, so
        // the lead falls through to `failed` instead of sticking in
        // `enriching`.
        let response = timeout(self.timeout, provider.lookup(&request))
            .await
            .map_err(|_| EnrichmentError::Timeout)??;

        let record = simplify(response)?;

        let data_json = serde_json::to_string(&record)?;
        lead::complete_enrichment(pool, &target.id, &data_json, &database::now_rfc3339()).await?;

        // Backfill only fields the operator has not set. The company name
        // lands on the lead too, so later resolution can link the contact to
        // the organization merged below.
        lead::backfill_profile(
            pool,
            &target.id,
            record.linkedin_url.as_deref(),
            record.job_title.as_deref(),
            record.company.as_ref().and_then(|c| c.name.as_deref()),
        )
        .await?;

        self.merge_company(pool, target, &record).await?;

        let metadata = json!({
            "source": "enrichment",
            "likelihood": record.likelihood,
        });
        activity::insert_activity(
            pool,
            &target.id,
            ActivityType::LeadUpdated,
            database::now_unix(),
            Some(&metadata.to_string()),
        )
        .await?;

        Ok(record)
    }

    /// Upsert the organization from provider company data, falling back to
    /// the lead's own company name.
    async fn merge_company(
        &self,
        pool: &SqlitePool,
        target: &Lead,
        record: &EnrichmentRecord,
    ) -> Result<(), EnrichmentError> {
        let provider_company = record.company.as_ref();
        let name = provider_company
            .and_then(|company| company.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .or(target.company.as_deref())
            .filter(|name| !name.trim().is_empty());

        let Some(name) = name else {
            return Ok(());
        };

        let attrs = CompanyAttrs {
            name: name.to_string(),
            website: provider_company.and_then(|company| company.website.clone()),
            linkedin_url: provider_company.and_then(|company| company.linkedin_url.clone()),
            size: provider_company.and_then(|company| company.size.clone()),
        };
        organization::upsert_organization(pool, &attrs).await?;

        Ok(())
    }

    /// Persist the failure onto the lead and append an error-tagged activity
    /// entry. Best effort: if even that fails, we can only log.
    async fn capture_failure(&self, pool: &SqlitePool, lead_id: &str, e: &EnrichmentError) {
        let blob = e.failure_blob();
        if let Err(store_err) = lead::fail_enrichment(pool, lead_id, &blob.to_string()).await {
            error!(lead_id, error = %store_err, "Could not record enrichment failure");
        }

        let metadata = json!({
            "source": "enrichment",
            "error": e.to_string(),
            "error_type": e.error_type(),
        });
        if let Err(store_err) = activity::insert_activity(
            pool,
            lead_id,
            ActivityType::LeadUpdated,
            database::now_unix(),
            Some(&metadata.to_string()),
        )
        .await
        {
            error!(lead_id, error = %store_err, "Could not record enrichment failure activity");
        }
    }
}
