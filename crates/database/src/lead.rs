//! Lead persistence and enrichment-status transitions.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{EnrichmentStatus, Lead, LeadStatus};

const LEAD_COLUMNS: &str = "id, email, first_name, last_name, company, linkedin_url, job_title, \
     status, enrichment_status, enrichment_data, enrichment_timestamp, created_at";

/// Create a new lead.
pub async fn create_lead(pool: &SqlitePool, lead: &Lead) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leads (id, email, first_name, last_name, company, linkedin_url,
                           job_title, status, enrichment_status, enrichment_data,
                           enrichment_timestamp, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&lead.id)
    .bind(&lead.email)
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.company)
    .bind(&lead.linkedin_url)
    .bind(&lead.job_title)
    .bind(lead.status)
    .bind(lead.enrichment_status)
    .bind(&lead.enrichment_data)
    .bind(&lead.enrichment_timestamp)
    .bind(&lead.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Lead",
                    id: lead.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Get a lead by ID.
pub async fn get_lead(pool: &SqlitePool, id: &str) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lead",
        id: id.to_string(),
    })
}

/// Find a lead by email, ignoring case and surrounding whitespace. Returns
/// the most recently captured lead when several share an address. Lead
/// emails are stored as captured, so the stored side is normalized too.
pub async fn get_lead_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Lead>> {
    let lead = sqlx::query_as::<_, Lead>(&format!(
        r#"
        SELECT {LEAD_COLUMNS} FROM leads
        WHERE LOWER(TRIM(email)) = ?
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(crate::normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(lead)
}

/// Conditionally transition a lead from `pending` to `enriching`.
///
/// Returns false if the lead was not in `pending`, which rejects a
/// concurrent second trigger instead of double-calling the provider.
pub async fn mark_enriching(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET enrichment_status = ?
        WHERE id = ? AND enrichment_status = ?
        "#,
    )
    .bind(EnrichmentStatus::Enriching)
    .bind(id)
    .bind(EnrichmentStatus::Pending)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Reset a terminal enrichment state back to `pending` for an explicit
/// re-trigger. Returns false if the lead was not in a terminal state.
pub async fn reset_enrichment(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET enrichment_status = ?, enrichment_data = NULL, enrichment_timestamp = NULL
        WHERE id = ? AND enrichment_status IN (?, ?)
        "#,
    )
    .bind(EnrichmentStatus::Pending)
    .bind(id)
    .bind(EnrichmentStatus::Completed)
    .bind(EnrichmentStatus::Failed)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a successful enrichment: the normalized provider payload and the
/// completion timestamp.
pub async fn complete_enrichment(
    pool: &SqlitePool,
    id: &str,
    data_json: &str,
    timestamp: &str,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET enrichment_status = ?, enrichment_data = ?, enrichment_timestamp = ?
        WHERE id = ?
        "#,
    )
    .bind(EnrichmentStatus::Completed)
    .bind(data_json)
    .bind(timestamp)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Record a failed enrichment with a structured error blob.
pub async fn fail_enrichment(pool: &SqlitePool, id: &str, error_json: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET enrichment_status = ?, enrichment_data = ?
        WHERE id = ?
        "#,
    )
    .bind(EnrichmentStatus::Failed)
    .bind(error_json)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Backfill `linkedin_url`, `job_title`, and `company` from enrichment,
/// keeping any existing non-empty (operator-entered) values.
pub async fn backfill_profile(
    pool: &SqlitePool,
    id: &str,
    linkedin_url: Option<&str>,
    job_title: Option<&str>,
    company: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE leads
        SET linkedin_url = COALESCE(NULLIF(linkedin_url, ''), ?),
            job_title = COALESCE(NULLIF(job_title, ''), ?),
            company = COALESCE(NULLIF(company, ''), ?)
        WHERE id = ?
        "#,
    )
    .bind(linkedin_url)
    .bind(job_title)
    .bind(company)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Set the lead status only when it differs from the current one.
///
/// Returns true if a row was updated. The guard keeps repeated sync passes
/// from churning status history.
pub async fn set_status_if_differs(
    pool: &SqlitePool,
    id: &str,
    status: LeadStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET status = ?
        WHERE id = ? AND status != ?
        "#,
    )
    .bind(status)
    .bind(id)
    .bind(status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
