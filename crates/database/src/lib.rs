//! SQLite persistence layer for the lead pipeline.
//!
//! This crate provides async database operations for leads, canonical
//! contacts and organizations, campaign enrollments, and the activity log,
//! using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{lead, models::Lead, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:leadpipe.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Capture a lead
//!     let new = Lead::capture(
//!         Some("ada@acme.com".to_string()),
//!         Some("Ada".to_string()),
//!         None,
//!         Some("Acme".to_string()),
//!     );
//!     lead::create_lead(db.pool(), &new).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod campaign;
pub mod contact;
pub mod enrollment;
pub mod error;
pub mod lead;
pub mod models;
pub mod organization;
pub mod settings;

pub use error::{DatabaseError, Result};
pub use models::{
    ActivityLogEntry, ActivityType, Campaign, CampaignEnrollment, Contact,
    EnrichmentStatus, EnrollmentStatus, Lead, LeadStatus, Organization, UserSettings,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Current time as an RFC 3339 string, the format used for row timestamps.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Current time as unix seconds, the format used for activity timestamps.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Normalize an email address for canonical lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent webhook ingestion alongside
    /// batch enrollment writes.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::Lead;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_lead_capture_roundtrip() {
        let db = test_db().await;

        let new = Lead::capture(
            Some("Ada@Acme.com".to_string()),
            Some("Ada".to_string()),
            Some("Lovelace".to_string()),
            Some("Acme".to_string()),
        );
        lead::create_lead(db.pool(), &new).await.unwrap();

        let fetched = lead::get_lead(db.pool(), &new.id).await.unwrap();
        assert_eq!(fetched.enrichment_status, EnrichmentStatus::Pending);
        assert_eq!(fetched.status, LeadStatus::New);
        assert_eq!(fetched.first_name.as_deref(), Some("Ada"));

        // Email lookup is case-insensitive.
        let by_email = lead::get_lead_by_email(db.pool(), "ada@acme.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, new.id);

        let missing = lead::get_lead(db.pool(), "no-such-id").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Acme.COM "), "ada@acme.com");
    }
}
