//! Per-user campaign provider settings.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::UserSettings;

/// Get settings for a user, if any are stored.
pub async fn get_user_settings(pool: &SqlitePool, user_id: &str) -> Result<Option<UserSettings>> {
    let settings = sqlx::query_as::<_, UserSettings>(
        r#"
        SELECT user_id, campaign_api_url, campaign_api_key, updated_at
        FROM user_settings
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(settings)
}

/// Create or replace a user's settings.
pub async fn upsert_user_settings(pool: &SqlitePool, settings: &UserSettings) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (user_id, campaign_api_url, campaign_api_key, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            campaign_api_url = excluded.campaign_api_url,
            campaign_api_key = excluded.campaign_api_key,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&settings.user_id)
    .bind(&settings.campaign_api_url)
    .bind(&settings.campaign_api_key)
    .bind(crate::now_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
