//! Lead enrichment orchestration.
//!
//! Drives a lead through the enrichment state machine: one outbound call to
//! the identity-resolution provider (with a cancellation timeout), provider
//! payload normalization, company merge into the canonical store, and
//! structured failure capture. Failures become lead state, never errors the
//! caller has to handle.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod record;

pub use config::EnrichmentConfig;
pub use error::{EnrichmentError, Result};
pub use orchestrator::{EnrichmentOrchestrator, EnrichmentOutcome};
pub use provider::{EnrichmentProvider, EnrichmentRequest, HttpEnrichmentProvider};
pub use record::{CompanyRecord, EnrichmentRecord};
