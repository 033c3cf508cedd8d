//! Campaign provider credentials.
//!
//! Credentials are plain data carried to a per-call client, never mutable
//! client state, so concurrent calls for different users cannot interfere.

use std::env;

use sqlx::SqlitePool;

use database::settings;

use crate::error::{CampaignError, Result};

/// Default provider API base URL.
pub const DEFAULT_API_URL: &str = "https://api.lemlist.com/api";

/// Credentials for the external campaign provider.
#[derive(Debug, Clone)]
pub struct CampaignCredentials {
    /// Provider API base URL.
    pub api_url: String,
    /// API key, sent basic-auth style (empty username, key as password).
    pub api_key: String,
}

impl CampaignCredentials {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Load credentials from the environment.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CAMPAIGN_API_KEY` | Provider API key | (required) |
    /// | `CAMPAIGN_API_URL` | Provider API base URL | `https://api.lemlist.com/api` |
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("CAMPAIGN_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CampaignError::Configuration(
                    "campaign provider credentials are not configured; \
                     set CAMPAIGN_API_KEY or store per-user settings"
                        .to_string(),
                )
            })?;

        let api_url = env::var("CAMPAIGN_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self::new(api_url, api_key))
    }

    /// Resolve credentials for a user: stored settings first, environment
    /// as fallback.
    pub async fn resolve(pool: &SqlitePool, user_id: Option<&str>) -> Result<Self> {
        if let Some(user_id) = user_id {
            if let Some(stored) = settings::get_user_settings(pool, user_id).await? {
                if let Some(api_key) = stored.campaign_api_key.filter(|key| !key.is_empty()) {
                    let api_url = stored
                        .campaign_api_url
                        .filter(|url| !url.is_empty())
                        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
                    return Ok(Self::new(api_url, api_key));
                }
            }
        }

        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::models::UserSettings;
    use database::Database;

    #[tokio::test]
    async fn test_resolve_prefers_stored_settings() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        settings::upsert_user_settings(
            db.pool(),
            &UserSettings {
                user_id: "user-1".to_string(),
                campaign_api_url: None,
                campaign_api_key: Some("stored-key".to_string()),
                updated_at: database::now_rfc3339(),
            },
        )
        .await
        .unwrap();

        let creds = CampaignCredentials::resolve(db.pool(), Some("user-1"))
            .await
            .unwrap();
        assert_eq!(creds.api_key, "stored-key");
        assert_eq!(creds.api_url, DEFAULT_API_URL);
    }
}
