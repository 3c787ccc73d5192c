use chrono::{Duration, NaiveDate, Utc};
use revenue_ingest::application::services::revenue_sync::{RevenueSyncService, SyncOutcome};
use revenue_ingest::config::IngestionConfig;
use revenue_ingest::domain::entities::report::Frequency;
use revenue_ingest::persistence::{init_database, repository::TransactionRepository};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: revenue-ingest [YYYY-MM-DD] [DAILY|WEEKLY|MONTHLY|YEARLY]";

fn parse_args(args: &[String]) -> Result<(NaiveDate, Frequency), String> {
    // Reports are published the day after, so default to yesterday
    let mut date = (Utc::now() - Duration::days(1)).date_naive();
    let mut frequency = Frequency::Daily;

    if let Some(raw) = args.first() {
        date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {}\n{}", raw, e, USAGE))?;
    }
    if let Some(raw) = args.get(1) {
        frequency = Frequency::parse(raw)
            .ok_or_else(|| format!("invalid frequency '{}'\n{}", raw, USAGE))?;
    }
    if args.len() > 2 {
        return Err(USAGE.to_string());
    }

    Ok((date, frequency))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before reading configuration
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "revenue_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (date, frequency) = parse_args(&args)?;

    let config = IngestionConfig::from_env();
    info!("Revenue ingestion starting for {} ({})", frequency.format_date(date), frequency);

    let mut service = RevenueSyncService::from_config(&config).map_err(|e| {
        error!("Failed to initialize revenue sync: {}", e);
        e
    })?;

    if let Some(url) = &config.database_url {
        let pool = init_database(url).await?;
        service = service.with_store(Arc::new(TransactionRepository::new(pool)));
    } else {
        warn!("DATABASE_URL not set, transactions will not be persisted");
    }

    let outcome = service.sync(date, frequency).await.map_err(|e| {
        error!("Revenue sync failed ({:?} severity): {}", e.severity(), e);
        e
    })?;

    if let SyncOutcome::NotConfigured { missing } = &outcome {
        warn!("Revenue ingestion is not configured (missing {})", missing);
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
