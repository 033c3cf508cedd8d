//! The campaign provider boundary: lead payloads, per-lead activity state,
//! and the HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CampaignCredentials;
use crate::error::{CampaignError, Result};

/// Lead payload in the provider's add-lead format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLead {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// A campaign as listed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCampaign {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

/// Per-lead activity flags returned by the provider's campaign-leads fetch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderLeadState {
    pub email: String,
    #[serde(default)]
    pub opened: bool,
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub replied: bool,
    pub opened_at: Option<String>,
    pub clicked_at: Option<String>,
    pub replied_at: Option<String>,
}

/// The seam to the external campaign provider.
#[async_trait]
pub trait CampaignApi: Send + Sync {
    /// List the provider's campaigns.
    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>>;

    /// Add one lead to a provider campaign.
    async fn add_lead(&self, campaign_id: &str, lead: &ProviderLead) -> Result<()>;

    /// Fetch all leads in a provider campaign with their activity flags.
    async fn campaign_leads(&self, campaign_id: &str) -> Result<Vec<ProviderLeadState>>;
}

/// reqwest-backed provider client. Constructed per call from credentials
/// carried as data.
pub struct HttpCampaignClient {
    client: Client,
    credentials: CampaignCredentials,
}

impl HttpCampaignClient {
    pub fn new(credentials: CampaignCredentials) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| CampaignError::Provider(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.credentials.api_url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CampaignError::Provider(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body.chars().take(500).collect::<String>()
        )))
    }
}

#[async_trait]
impl CampaignApi for HttpCampaignClient {
    async fn list_campaigns(&self) -> Result<Vec<ProviderCampaign>> {
        let response = self
            .client
            .get(self.url("campaigns"))
            .basic_auth("", Some(&self.credentials.api_key))
            .send()
            .await
            .map_err(|e| CampaignError::Provider(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| CampaignError::Provider(format!("unparseable campaign list: {e}")))
    }

    async fn add_lead(&self, campaign_id: &str, lead: &ProviderLead) -> Result<()> {
        debug!(campaign_id, email = %lead.email, "Adding lead to provider campaign");

        let response = self
            .client
            .post(self.url(&format!("campaigns/{campaign_id}/leads")))
            .basic_auth("", Some(&self.credentials.api_key))
            .json(lead)
            .send()
            .await
            .map_err(|e| CampaignError::Provider(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn campaign_leads(&self, campaign_id: &str) -> Result<Vec<ProviderLeadState>> {
        let response = self
            .client
            .get(self.url(&format!("campaigns/{campaign_id}/leads")))
            .basic_auth("", Some(&self.credentials.api_key))
            .send()
            .await
            .map_err(|e| CampaignError::Provider(e.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| CampaignError::Provider(format!("unparseable lead list: {e}")))
    }
}
