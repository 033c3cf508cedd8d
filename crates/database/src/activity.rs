//! Append-only activity log with a time-window dedup check.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{ActivityLogEntry, ActivityType};

/// Window inside which a repeated (lead, activity type) event is treated as
/// a redelivery rather than a new occurrence.
pub const DEDUP_WINDOW_SECS: i64 = 60;

/// Append an activity entry.
pub async fn insert_activity(
    pool: &SqlitePool,
    lead_id: &str,
    activity_type: ActivityType,
    occurred_at: i64,
    metadata: Option<&str>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO activity_log (lead_id, activity_type, occurred_at, metadata)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(lead_id)
    .bind(activity_type)
    .bind(occurred_at)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Whether an entry of this type already exists for the lead within the
/// dedup window around `occurred_at`.
///
/// This is a boundary, not a uniqueness constraint: a genuine second
/// occurrence outside the window is still recorded.
pub async fn has_recent(
    pool: &SqlitePool,
    lead_id: &str,
    activity_type: ActivityType,
    occurred_at: i64,
    window_secs: i64,
) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM activity_log
            WHERE lead_id = ? AND activity_type = ? AND ABS(occurred_at - ?) <= ?
        )
        "#,
    )
    .bind(lead_id)
    .bind(activity_type)
    .bind(occurred_at)
    .bind(window_secs)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// List all activity for a lead, newest first.
pub async fn list_for_lead(pool: &SqlitePool, lead_id: &str) -> Result<Vec<ActivityLogEntry>> {
    let entries = sqlx::query_as::<_, ActivityLogEntry>(
        r#"
        SELECT id, lead_id, activity_type, occurred_at, metadata
        FROM activity_log
        WHERE lead_id = ?
        ORDER BY occurred_at DESC, id DESC
        "#,
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lead;
    use crate::{lead, Database};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_lead(db: &Database) -> String {
        let new = Lead::capture(Some("a@b.com".to_string()), None, None, None);
        lead::create_lead(db.pool(), &new).await.unwrap();
        new.id
    }

    #[tokio::test]
    async fn test_dedup_window_boundaries() {
        let db = test_db().await;
        let lead_id = seed_lead(&db).await;
        let base = 1_700_000_000;

        insert_activity(db.pool(), &lead_id, ActivityType::EmailOpened, base, None)
            .await
            .unwrap();

        // 10s later: inside the window.
        assert!(has_recent(
            db.pool(),
            &lead_id,
            ActivityType::EmailOpened,
            base + 10,
            DEDUP_WINDOW_SECS
        )
        .await
        .unwrap());

        // 90s later: a genuine second occurrence.
        assert!(!has_recent(
            db.pool(),
            &lead_id,
            ActivityType::EmailOpened,
            base + 90,
            DEDUP_WINDOW_SECS
        )
        .await
        .unwrap());

        // A different type at the same instant is unrelated.
        assert!(!has_recent(
            db.pool(),
            &lead_id,
            ActivityType::EmailClicked,
            base,
            DEDUP_WINDOW_SECS
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn test_list_for_lead_newest_first() {
        let db = test_db().await;
        let lead_id = seed_lead(&db).await;

        insert_activity(db.pool(), &lead_id, ActivityType::EmailSent, 100, None)
            .await
            .unwrap();
        insert_activity(db.pool(), &lead_id, ActivityType::EmailOpened, 200, None)
            .await
            .unwrap();

        let entries = list_for_lead(db.pool(), &lead_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity_type, ActivityType::EmailOpened);
    }
}
