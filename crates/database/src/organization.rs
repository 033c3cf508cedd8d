//! Organization upsert and lookup.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::Organization;

const ORG_COLUMNS: &str =
    "id, name, normalized_name, website, linkedin_url, size, last_activity, updated_at";

/// Attributes arriving for a company, from enrichment or contact resolution.
#[derive(Debug, Clone, Default)]
pub struct CompanyAttrs {
    pub name: String,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub size: Option<String>,
}

impl CompanyAttrs {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Get an organization by ID.
pub async fn get_organization(pool: &SqlitePool, id: &str) -> Result<Organization> {
    sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORG_COLUMNS} FROM organizations WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Organization",
        id: id.to_string(),
    })
}

/// Find an organization by case-insensitive name match.
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Organization>> {
    let org = sqlx::query_as::<_, Organization>(&format!(
        "SELECT {ORG_COLUMNS} FROM organizations WHERE normalized_name = ?"
    ))
    .bind(normalize_name(name))
    .fetch_optional(pool)
    .await?;

    Ok(org)
}

/// Create or update an organization keyed by normalized name, returning its id.
///
/// Existing rows are merged field by field: a new value only overwrites when
/// it is non-empty. Two concurrent upserts for a new name race on the insert;
/// the loser hits the unique key and falls back to the merge path.
pub async fn upsert_organization(pool: &SqlitePool, attrs: &CompanyAttrs) -> Result<String> {
    if let Some(existing) = find_by_name(pool, &attrs.name).await? {
        merge_fields(pool, &existing.id, attrs).await?;
        return Ok(existing.id);
    }

    let id = Uuid::new_v4().to_string();
    let insert = sqlx::query(
        r#"
        INSERT INTO organizations (id, name, normalized_name, website, linkedin_url,
                                   size, last_activity, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, NULL, ?)
        "#,
    )
    .bind(&id)
    .bind(attrs.name.trim())
    .bind(normalize_name(&attrs.name))
    .bind(&attrs.website)
    .bind(&attrs.linkedin_url)
    .bind(&attrs.size)
    .bind(crate::now_rfc3339())
    .execute(pool)
    .await;

    match insert {
        Ok(_) => Ok(id),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // Lost the insert race; the row exists now.
            let existing = find_by_name(pool, &attrs.name)
                .await?
                .ok_or_else(|| DatabaseError::NotFound {
                    entity: "Organization",
                    id: attrs.name.clone(),
                })?;
            merge_fields(pool, &existing.id, attrs).await?;
            Ok(existing.id)
        }
        Err(e) => Err(DatabaseError::Sqlx(e)),
    }
}

async fn merge_fields(pool: &SqlitePool, id: &str, attrs: &CompanyAttrs) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE organizations
        SET website = COALESCE(NULLIF(?, ''), website),
            linkedin_url = COALESCE(NULLIF(?, ''), linkedin_url),
            size = COALESCE(NULLIF(?, ''), size),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&attrs.website)
    .bind(&attrs.linkedin_url)
    .bind(&attrs.size)
    .bind(crate::now_rfc3339())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record campaign activity against the organization, for staleness displays.
pub async fn touch_last_activity(pool: &SqlitePool, id: &str) -> Result<()> {
    sqlx::query("UPDATE organizations SET last_activity = ? WHERE id = ?")
        .bind(crate::now_rfc3339())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_upsert_deduplicates_by_name() {
        let db = test_db().await;

        let first = upsert_organization(db.pool(), &CompanyAttrs::named("Acme"))
            .await
            .unwrap();
        let second = upsert_organization(db.pool(), &CompanyAttrs::named("  ACME "))
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_merge_only_overwrites_with_non_empty() {
        let db = test_db().await;

        let id = upsert_organization(
            db.pool(),
            &CompanyAttrs {
                name: "Acme".to_string(),
                website: Some("https://acme.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Empty website must not clobber the stored one; size fills in.
        upsert_organization(
            db.pool(),
            &CompanyAttrs {
                name: "acme".to_string(),
                website: Some(String::new()),
                size: Some("51-200".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let org = get_organization(db.pool(), &id).await.unwrap();
        assert_eq!(org.website.as_deref(), Some("https://acme.com"));
        assert_eq!(org.size.as_deref(), Some("51-200"));
    }

    #[tokio::test]
    async fn test_touch_last_activity() {
        let db = test_db().await;
        let id = upsert_organization(db.pool(), &CompanyAttrs::named("Acme"))
            .await
            .unwrap();

        touch_last_activity(db.pool(), &id).await.unwrap();
        let org = get_organization(db.pool(), &id).await.unwrap();
        assert!(org.last_activity.is_some());
    }
}
