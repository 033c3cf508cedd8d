//! The enrichment provider boundary: request/response payloads and the
//! HTTP implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use database::models::Lead;

use crate::config::EnrichmentConfig;
use crate::error::{EnrichmentError, Result};

/// Maximum characters of a non-JSON error body kept in the failure record.
const ERROR_BODY_LIMIT: usize = 1000;

/// Outbound payload sent to the enrichment webhook.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentRequest {
    pub lead_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    pub timestamp: String,
}

impl EnrichmentRequest {
    /// Build the request from a lead's identifying fields.
    pub fn from_lead(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id.clone(),
            company: lead.company.clone(),
            email: lead.email.clone(),
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            linkedin_url: lead.linkedin_url.clone(),
            timestamp: database::now_rfc3339(),
        }
    }
}

/// Raw provider response. The inner `status` is the provider's own verdict,
/// distinct from the HTTP status of the call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderResponse {
    pub status: Option<i64>,
    /// Match-confidence score reported by the provider.
    pub likelihood: Option<f64>,
    pub data: Option<ProviderData>,
}

/// Identity and company fields in a provider match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderData {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub company: Option<ProviderCompany>,
}

/// Company attributes in a provider match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderCompany {
    pub name: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub size: Option<String>,
}

/// The seam to the identity-resolution provider.
///
/// The production implementation is [`HttpEnrichmentProvider`]; tests swap
/// in mocks to simulate timeouts, HTTP failures, and no-match responses.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Look up identity/company data for the lead's identifying fields.
    async fn lookup(&self, request: &EnrichmentRequest) -> Result<ProviderResponse>;
}

/// reqwest-backed provider client.
pub struct HttpEnrichmentProvider {
    client: Client,
    config: EnrichmentConfig,
}

impl HttpEnrichmentProvider {
    /// Create a provider client for the configured webhook.
    pub fn new(config: EnrichmentConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| EnrichmentError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    async fn lookup(&self, request: &EnrichmentRequest) -> Result<ProviderResponse> {
        debug!(lead_id = %request.lead_id, url = %self.config.webhook_url, "Calling enrichment webhook");

        let response = self
            .client
            .post(&self.config.webhook_url)
            .header("x-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout
                } else {
                    EnrichmentError::Transport(e.to_string())
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Http {
                code: status.as_u16(),
                details: capture_error_body(&body),
            });
        }

        response
            .json::<ProviderResponse>()
            .await
            .map_err(|e| EnrichmentError::ProviderDataAbsent(format!(
                "Unparseable provider response: {e}"
            )))
    }
}

/// Best-effort JSON parse of an error body, else the first 1000 characters
/// as text.
fn capture_error_body(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| {
        let truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        serde_json::Value::String(truncated)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_absent_fields() {
        let lead = Lead::capture(Some("a@b.com".to_string()), None, None, None);
        let request = EnrichmentRequest::from_lead(&lead);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["email"], "a@b.com");
        assert!(value.get("first_name").is_none());
        assert!(value.get("company").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_capture_error_body_prefers_json() {
        let parsed = capture_error_body(r#"{"message":"rate limited"}"#);
        assert_eq!(parsed["message"], "rate limited");
    }

    #[test]
    fn test_capture_error_body_truncates_text() {
        let long = "x".repeat(5000);
        let parsed = capture_error_body(&long);
        assert_eq!(parsed.as_str().unwrap().len(), ERROR_BODY_LIMIT);
    }
}
