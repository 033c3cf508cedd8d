//! Contact resolution: deduplicates raw leads into canonical [`Contact`] and
//! [`Organization`](database::Organization) records.
//!
//! Resolution is idempotent on the lead's normalized email. A lead whose
//! contact already exists resolves to the existing id without mutation; a
//! partial earlier run (organization created, contact insert failed) is
//! repaired on retry because the organization upsert finds the existing row.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use database::models::{Contact, Lead};
use database::organization::{self, CompanyAttrs};
use database::{contact, DatabaseError};

/// Provenance tag written onto contacts created by this pipeline.
pub const PIPELINE_SOURCE: &str = "lead-pipeline";

/// Errors that can occur while resolving a lead.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The lead carries no identifying signal at all.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persistence failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Outcome of resolving a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical contact id (existing or newly created).
    pub contact_id: String,
    /// Linked organization, when the contact has one.
    pub organization_id: Option<String>,
    /// Whether a new contact row was created by this call.
    pub created: bool,
}

/// Resolve a lead to its canonical contact, creating contact and
/// organization rows as needed.
pub async fn resolve(pool: &SqlitePool, lead: &Lead) -> Result<Resolution> {
    if lead.email.is_none() && lead.first_name.is_none() && lead.last_name.is_none() {
        return Err(ResolveError::Validation(format!(
            "lead {} has no email or name to resolve by",
            lead.id
        )));
    }

    // Exact match on normalized email wins without any mutation.
    if let Some(email) = lead.email.as_deref() {
        if let Some(existing) = contact::get_contact_by_email(pool, email).await? {
            debug!(lead_id = %lead.id, contact_id = %existing.id, "Lead matched existing contact");
            return Ok(Resolution {
                contact_id: existing.id,
                organization_id: existing.organization_id,
                created: false,
            });
        }
    }

    let organization_id = match lead.company.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            Some(organization::upsert_organization(pool, &CompanyAttrs::named(name)).await?)
        }
        _ => None,
    };

    let new_contact = Contact {
        id: Uuid::new_v4().to_string(),
        name: display_name(lead),
        email: lead.email.as_deref().map(database::normalize_email),
        organization_id: organization_id.clone(),
        source: Some(PIPELINE_SOURCE.to_string()),
        created_at: database::now_rfc3339(),
    };
    contact::create_contact(pool, &new_contact).await?;

    info!(
        lead_id = %lead.id,
        contact_id = %new_contact.id,
        organization_id = ?organization_id,
        "Created contact from lead"
    );

    Ok(Resolution {
        contact_id: new_contact.id,
        organization_id,
        created: true,
    })
}

/// Join first and last names, falling back to "Unknown".
fn display_name(lead: &Lead) -> String {
    let joined = [lead.first_name.as_deref(), lead.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        "Unknown".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{organization, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn lead_with(
        email: Option<&str>,
        first: Option<&str>,
        last: Option<&str>,
        company: Option<&str>,
    ) -> Lead {
        Lead::capture(
            email.map(String::from),
            first.map(String::from),
            last.map(String::from),
            company.map(String::from),
        )
    }

    #[tokio::test]
    async fn test_resolve_requires_some_signal() {
        let db = test_db().await;
        let lead = lead_with(None, None, None, Some("Acme"));

        let result = resolve(db.pool(), &lead).await;
        assert!(matches!(result, Err(ResolveError::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let db = test_db().await;
        let lead = lead_with(Some("Ada@Acme.com"), Some("Ada"), Some("Lovelace"), Some("Acme"));

        let first = resolve(db.pool(), &lead).await.unwrap();
        assert!(first.created);
        assert!(first.organization_id.is_some());

        let second = resolve(db.pool(), &lead).await.unwrap();
        assert!(!second.created);
        assert_eq!(first.contact_id, second.contact_id);
        assert_eq!(first.organization_id, second.organization_id);

        assert_eq!(contact::count_contacts(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolve_reuses_existing_organization() {
        let db = test_db().await;

        let org_id = organization::upsert_organization(
            db.pool(),
            &organization::CompanyAttrs::named("Acme"),
        )
        .await
        .unwrap();

        let lead = lead_with(Some("bob@acme.com"), Some("Bob"), None, Some("ACME"));
        let resolution = resolve(db.pool(), &lead).await.unwrap();
        assert_eq!(resolution.organization_id.as_deref(), Some(org_id.as_str()));
    }

    #[tokio::test]
    async fn test_display_name_fallback() {
        let db = test_db().await;
        let lead = lead_with(Some("x@y.com"), None, None, None);

        let resolution = resolve(db.pool(), &lead).await.unwrap();
        let created = contact::get_contact(db.pool(), &resolution.contact_id)
            .await
            .unwrap();
        assert_eq!(created.name, "Unknown");
        assert_eq!(created.email.as_deref(), Some("x@y.com"));
        assert_eq!(created.source.as_deref(), Some(PIPELINE_SOURCE));
    }
}
