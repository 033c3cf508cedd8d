//! Campaign enrollment upserts keyed on (campaign, contact).

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::Result;
use crate::models::{CampaignEnrollment, EnrollmentStatus};

/// Enroll a contact in a campaign if not already enrolled.
///
/// Returns true if a new row was inserted. Re-enrollment is a no-op: the
/// conflict policy never creates a duplicate and never mutates an existing
/// enrollment's status.
///
/// Generic over the executor so the batcher can run a chunk inside one
/// transaction.
pub async fn upsert_enrollment<'e, E>(
    executor: E,
    campaign_id: &str,
    contact_id: &str,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO campaign_enrollments (campaign_id, contact_id, status, enrolled_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (campaign_id, contact_id) DO NOTHING
        "#,
    )
    .bind(campaign_id)
    .bind(contact_id)
    .bind(EnrollmentStatus::Active)
    .bind(crate::now_rfc3339())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get an enrollment by its natural key.
pub async fn get_enrollment(
    pool: &SqlitePool,
    campaign_id: &str,
    contact_id: &str,
) -> Result<Option<CampaignEnrollment>> {
    let enrollment = sqlx::query_as::<_, CampaignEnrollment>(
        r#"
        SELECT campaign_id, contact_id, status, enrolled_at
        FROM campaign_enrollments
        WHERE campaign_id = ? AND contact_id = ?
        "#,
    )
    .bind(campaign_id)
    .bind(contact_id)
    .fetch_optional(pool)
    .await?;

    Ok(enrollment)
}

/// Update the status of an existing enrollment. Returns true if a row changed.
pub async fn set_enrollment_status(
    pool: &SqlitePool,
    campaign_id: &str,
    contact_id: &str,
    status: EnrollmentStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE campaign_enrollments
        SET status = ?
        WHERE campaign_id = ? AND contact_id = ?
        "#,
    )
    .bind(status)
    .bind(campaign_id)
    .bind(contact_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count enrollments for a campaign.
pub async fn count_enrollments(pool: &SqlitePool, campaign_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM campaign_enrollments WHERE campaign_id = ?",
    )
    .bind(campaign_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, Contact};
    use crate::{campaign, contact, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed(db: &Database) -> (String, String) {
        let camp = Campaign {
            id: "local-1".to_string(),
            name: "Q3 outreach".to_string(),
            created_at: crate::now_rfc3339(),
        };
        campaign::create_campaign(db.pool(), &camp).await.unwrap();

        let person = Contact {
            id: "contact-1".to_string(),
            name: "Ada Lovelace".to_string(),
            email: Some("ada@acme.com".to_string()),
            organization_id: None,
            source: Some("lead-pipeline".to_string()),
            created_at: crate::now_rfc3339(),
        };
        contact::create_contact(db.pool(), &person).await.unwrap();

        (camp.id, person.id)
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = test_db().await;
        let (camp, person) = seed(&db).await;

        assert!(upsert_enrollment(db.pool(), &camp, &person).await.unwrap());
        assert!(!upsert_enrollment(db.pool(), &camp, &person).await.unwrap());

        assert_eq!(count_enrollments(db.pool(), &camp).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reenrollment_keeps_existing_status() {
        let db = test_db().await;
        let (camp, person) = seed(&db).await;

        upsert_enrollment(db.pool(), &camp, &person).await.unwrap();
        set_enrollment_status(db.pool(), &camp, &person, EnrollmentStatus::Paused)
            .await
            .unwrap();

        // Re-enrollment must not resurrect the paused enrollment.
        upsert_enrollment(db.pool(), &camp, &person).await.unwrap();
        let enrollment = get_enrollment(db.pool(), &camp, &person)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Paused);
    }
}
