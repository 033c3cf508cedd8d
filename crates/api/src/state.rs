//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use enrichment::{EnrichmentOrchestrator, HttpEnrichmentProvider};

/// Shared application state.
///
/// Campaign provider clients are deliberately not held here: they are
/// constructed per request from resolved credentials so concurrent calls
/// for different users never share mutable client state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Enrichment orchestrator (a no-op when unconfigured).
    pub enrichment: Arc<EnrichmentOrchestrator<HttpEnrichmentProvider>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, enrichment: EnrichmentOrchestrator<HttpEnrichmentProvider>) -> Self {
        Self {
            db,
            enrichment: Arc::new(enrichment),
        }
    }
}
