//! Normalized enrichment record persisted into `enrichment_data`.

use serde::{Deserialize, Serialize};

use crate::error::{EnrichmentError, Result};
use crate::provider::ProviderResponse;

/// Company attributes extracted from a provider match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: Option<String>,
    pub website: Option<String>,
    pub linkedin_url: Option<String>,
    pub size: Option<String>,
}

/// The simplified shape of a successful enrichment, stored on the lead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub linkedin_url: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub company: Option<CompanyRecord>,
    /// Match-confidence score from the provider. Recorded for operators;
    /// does not gate the company merge.
    pub likelihood: Option<f64>,
}

/// Reduce a raw provider response to the normalized record.
///
/// A 2xx call whose payload carries no usable match is a failure with a
/// reason an operator can tell apart from a transport problem.
pub fn simplify(response: ProviderResponse) -> Result<EnrichmentRecord> {
    if response.status.is_none() && response.data.is_none() {
        return Err(EnrichmentError::ProviderDataAbsent(
            "No response from provider".to_string(),
        ));
    }

    if let Some(status) = response.status {
        if status != 200 {
            return Err(EnrichmentError::ProviderDataAbsent(format!(
                "Provider returned status {status}"
            )));
        }
    }

    let data = response.data.ok_or_else(|| {
        EnrichmentError::ProviderDataAbsent("No data in provider response".to_string())
    })?;

    Ok(EnrichmentRecord {
        full_name: data.full_name,
        first_name: data.first_name,
        last_name: data.last_name,
        linkedin_url: data.linkedin_url,
        job_title: data.job_title,
        location: data.location,
        company: data.company.map(|company| CompanyRecord {
            name: company.name,
            website: company.website,
            linkedin_url: company.linkedin_url,
            size: company.size,
        }),
        likelihood: response.likelihood,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderCompany, ProviderData};

    #[test]
    fn test_simplify_empty_response() {
        let err = simplify(ProviderResponse::default()).unwrap_err();
        assert_eq!(err.to_string(), "No response from provider");
    }

    #[test]
    fn test_simplify_inner_error_status() {
        let response = ProviderResponse {
            status: Some(404),
            ..Default::default()
        };
        let err = simplify(response).unwrap_err();
        assert_eq!(err.to_string(), "Provider returned status 404");
    }

    #[test]
    fn test_simplify_status_ok_without_data() {
        let response = ProviderResponse {
            status: Some(200),
            ..Default::default()
        };
        let err = simplify(response).unwrap_err();
        assert_eq!(err.to_string(), "No data in provider response");
    }

    #[test]
    fn test_simplify_full_match() {
        let response = ProviderResponse {
            status: Some(200),
            likelihood: Some(0.92),
            data: Some(ProviderData {
                full_name: Some("Ada Lovelace".to_string()),
                job_title: Some("Engineer".to_string()),
                company: Some(ProviderCompany {
                    name: Some("Acme".to_string()),
                    size: Some("51-200".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        };

        let record = simplify(response).unwrap();
        assert_eq!(record.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(record.likelihood, Some(0.92));
        assert_eq!(
            record.company.as_ref().and_then(|c| c.name.as_deref()),
            Some("Acme")
        );
    }
}
