//! Campaign registry.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Campaign;

/// Create a new campaign.
pub async fn create_campaign(pool: &SqlitePool, campaign: &Campaign) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO campaigns (id, name, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&campaign.id)
    .bind(&campaign.name)
    .bind(&campaign.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Campaign",
                    id: campaign.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Find a campaign by ID.
pub async fn get_campaign(pool: &SqlitePool, id: &str) -> Result<Option<Campaign>> {
    let campaign = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, name, created_at
        FROM campaigns
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(campaign)
}

/// List all campaigns.
pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<Campaign>> {
    let campaigns = sqlx::query_as::<_, Campaign>(
        r#"
        SELECT id, name, created_at
        FROM campaigns
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(campaigns)
}
