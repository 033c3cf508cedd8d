//! Activity sync reconciliation.
//!
//! Ingests third-party campaign events through a push webhook and a pull
//! sync, maps them to canonical activity types and guarded status
//! transitions, and deduplicates against already-recorded history.

pub mod error;
pub mod events;
pub mod reconciler;

pub use error::{Result, SyncError};
pub use events::{map_event_type, EventMapping};
pub use reconciler::{
    ingest_webhook, sync_campaign, SyncFailure, SyncOutcome, SyncReport, WebhookEvent,
};
