//! Campaign enrollment against the local store and the external campaign
//! provider.
//!
//! The batcher is idempotent (enrollment is upserted on its natural key),
//! chunked, and partial-failure safe: a bad lead, a failed chunk, or a
//! rejected provider call is reported per item without aborting the batch.

pub mod config;
pub mod enroll;
pub mod error;
pub mod provider;

pub use config::CampaignCredentials;
pub use enroll::{enroll, EnrollmentFailure, EnrollmentReport, EnrollmentTarget, CHUNK_SIZE};
pub use error::{CampaignError, Result};
pub use provider::{
    CampaignApi, HttpCampaignClient, ProviderCampaign, ProviderLead, ProviderLeadState,
};
