//! HTTP surface for the lead pipeline.
//!
//! Exposes lead capture and enrichment triggers, the campaign registry with
//! enrollment batches, and the provider activity sync (push webhook + pull).

mod config;
mod error;
mod routes;
mod state;

use database::Database;
use enrichment::EnrichmentOrchestrator;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting lead pipeline server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build the enrichment orchestrator; a missing provider configuration
    // leaves captured leads pending rather than failing startup.
    let enrichment = EnrichmentOrchestrator::from_config(config.enrichment.clone());

    // Build application state
    let state = AppState::new(db, enrichment);

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Lead pipeline server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
