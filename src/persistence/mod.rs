//! Persistence Layer
//!
//! Stores finalized transactions in SQLite through sqlx. Rows are keyed by
//! `transaction_id` and never overwritten, so ingesting the same report twice
//! leaves the table unchanged.
//!
//! # Database Schema
//!
//! ## Transactions Table
//! - transaction_id: primary key
//! - transaction_date: report date
//! - gross_amount / apple_fee_amount / net_amount: USD, signed (refunds negative)
//! - original_currency / original_amount: pre-conversion net
//! - product_id / product_type / subscription_type / subscription_id
//! - country_code / region / device_type / app_version
//! - is_new / is_renewal / is_refund
//! - source: "api" or "mock"
//! - created_at: insertion timestamp

pub mod models;
pub mod repository;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub type DbPool = SqlitePool;

/// Database initialization error
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/revenue.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Initialize the database connection pool
///
/// # Arguments
/// - `database_url`: SQLite URL (e.g., "sqlite://data/revenue.db" or "sqlite::memory:")
///
/// # Errors
/// Returns error if database connection fails or migrations fail
pub async fn init_database(database_url: &str) -> Result<DbPool, DatabaseError> {
    init_with_config(&DatabaseConfig {
        url: database_url.to_string(),
        ..DatabaseConfig::default()
    })
    .await
}

pub async fn init_with_config(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    info!("Initializing database: {}", config.url);

    // Ensure data directory exists
    if let Some(db_path) = config.url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConnectionError(sqlx::Error::Configuration(Box::new(e)))
                })?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .log_statements(tracing::log::LevelFilter::Debug);

    // Every in-memory connection is its own database
    let max_connections = if config.url.contains(":memory:") {
        1
    } else {
        config.max_connections
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("✓ Database initialized successfully");

    Ok(pool)
}

/// Run database migrations
async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            transaction_id TEXT PRIMARY KEY,
            transaction_date DATE NOT NULL,
            gross_amount REAL NOT NULL,
            apple_fee_rate REAL NOT NULL,
            apple_fee_amount REAL NOT NULL,
            net_amount REAL NOT NULL,
            currency TEXT NOT NULL,
            original_currency TEXT NOT NULL,
            original_amount REAL NOT NULL,
            currency_conversion_rate REAL NOT NULL,
            is_new BOOLEAN NOT NULL,
            subscription_type TEXT,
            subscription_id TEXT,
            product_id TEXT NOT NULL,
            product_type TEXT NOT NULL CHECK(product_type IN ('subscription', 'in-app-purchase')),
            quantity INTEGER NOT NULL,
            country_code TEXT NOT NULL,
            region TEXT NOT NULL,
            device_type TEXT,
            app_version TEXT,
            is_refund BOOLEAN NOT NULL,
            is_renewal BOOLEAN NOT NULL,
            source TEXT NOT NULL CHECK(source IN ('api', 'mock')),
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create transactions table: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date)",
    )
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create date index: {}", e)))?;

    info!("✓ Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_init() {
        let pool = init_database("sqlite::memory:").await;
        assert!(pool.is_ok());
    }

    #[tokio::test]
    async fn test_migrations() {
        let pool = init_database("sqlite::memory:").await.unwrap();

        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'transactions'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/nested/revenue.db", dir.path().display());
        let pool = init_database(&url).await.unwrap();
        drop(pool);
        assert!(dir.path().join("nested/revenue.db").exists());
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, "sqlite://data/revenue.db");
        assert_eq!(config.max_connections, 5);
    }
}
