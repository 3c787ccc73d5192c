use crate::domain::errors::IngestionError;
use crate::domain::services::classifier::TransactionIdStrategy;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.appstoreconnect.apple.com/v1";

/// Credentials needed to sign API tokens and address the vendor's reports.
#[derive(Clone)]
pub struct Credentials {
    pub key_id: String,
    pub issuer_id: String,
    pub private_key_path: PathBuf,
    pub vendor_number: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &"<REDACTED>")
            .field("issuer_id", &"<REDACTED>")
            .field("private_key_path", &self.private_key_path)
            .field("vendor_number", &self.vendor_number)
            .finish()
    }
}

/// Configuration of the ingestion pipeline. Built once at startup and passed
/// in; nothing below the binary reads the environment.
#[derive(Clone)]
pub struct IngestionConfig {
    pub key_id: Option<String>,
    pub issuer_id: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub vendor_number: Option<String>,
    pub api_base: String,
    pub install_root: Option<PathBuf>, // Base for relative key paths
    pub request_timeout_ms: u64,       // Deadline for one report fetch
    pub requests_per_minute: u32,      // Outbound API rate limit
    pub allow_substitute_data: bool,   // Synthesize reports when unconfigured
    pub transaction_id_strategy: TransactionIdStrategy,
    pub database_url: Option<String>,
}

impl std::fmt::Debug for IngestionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionConfig")
            .field("key_id", &self.key_id.as_ref().map(|_| "<REDACTED>"))
            .field("issuer_id", &self.issuer_id.as_ref().map(|_| "<REDACTED>"))
            .field("private_key_path", &self.private_key_path)
            .field("vendor_number", &self.vendor_number)
            .field("api_base", &self.api_base)
            .field("install_root", &self.install_root)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("allow_substitute_data", &self.allow_substitute_data)
            .field("transaction_id_strategy", &self.transaction_id_strategy)
            .field("database_url", &self.database_url)
            .finish()
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            issuer_id: None,
            private_key_path: None,
            vendor_number: None,
            api_base: DEFAULT_API_BASE.to_string(),
            install_root: None,
            request_timeout_ms: 30_000, // 30 seconds
            requests_per_minute: 60,
            allow_substitute_data: false,
            transaction_id_strategy: TransactionIdStrategy::Random,
            database_url: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl IngestionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> IngestionConfig {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> IngestionConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = IngestionConfig::default();

        config.key_id = non_empty(lookup("APPSTORE_KEY_ID"));
        config.issuer_id = non_empty(lookup("APPSTORE_ISSUER_ID"));
        config.private_key_path = non_empty(lookup("APPSTORE_PRIVATE_KEY_PATH")).map(PathBuf::from);
        config.vendor_number = non_empty(lookup("APPSTORE_VENDOR_NUMBER"));
        config.install_root = non_empty(lookup("APPSTORE_INSTALL_ROOT")).map(PathBuf::from);
        config.database_url = non_empty(lookup("DATABASE_URL"));

        if let Some(base) = non_empty(lookup("APPSTORE_API_BASE")) {
            if base.starts_with("http://") || base.starts_with("https://") {
                config.api_base = base.trim_end_matches('/').to_string();
            } else {
                tracing::warn!(
                    "Invalid APPSTORE_API_BASE '{}' (must be an http(s) URL), using default: {}",
                    base,
                    config.api_base
                );
            }
        }

        if let Some(timeout) = lookup("REPORT_REQUEST_TIMEOUT_MS") {
            match timeout.trim().parse::<u64>() {
                Ok(value) if (1_000..=300_000).contains(&value) => {
                    config.request_timeout_ms = value;
                }
                Ok(value) => {
                    tracing::warn!(
                        "Invalid REPORT_REQUEST_TIMEOUT_MS value: {} (must be between 1000 and 300000), using default: {}",
                        value, config.request_timeout_ms
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse REPORT_REQUEST_TIMEOUT_MS '{}': {}, using default: {}",
                        timeout,
                        e,
                        config.request_timeout_ms
                    );
                }
            }
        }

        if let Some(rpm) = lookup("REPORT_REQUESTS_PER_MINUTE") {
            match rpm.trim().parse::<u32>() {
                Ok(value) if (1..=3600).contains(&value) => {
                    config.requests_per_minute = value;
                }
                _ => {
                    tracing::warn!(
                        "Invalid REPORT_REQUESTS_PER_MINUTE '{}' (must be between 1 and 3600), using default: {}",
                        rpm,
                        config.requests_per_minute
                    );
                }
            }
        }

        if let Some(enabled) = lookup("ALLOW_SUBSTITUTE_DATA") {
            config.allow_substitute_data = enabled.to_lowercase() == "true" || enabled == "1";
        }

        if let Some(strategy) = lookup("TRANSACTION_ID_STRATEGY") {
            match TransactionIdStrategy::parse(&strategy) {
                Some(value) => config.transaction_id_strategy = value,
                None => {
                    tracing::warn!(
                        "Unknown TRANSACTION_ID_STRATEGY '{}', using default: {:?}",
                        strategy,
                        config.transaction_id_strategy
                    );
                }
            }
        }

        config
    }

    /// All four credential values, or `NotConfigured` naming the missing ones.
    pub fn credentials(&self) -> Result<Credentials, IngestionError> {
        let mut missing = Vec::new();
        if self.key_id.is_none() {
            missing.push("APPSTORE_KEY_ID");
        }
        if self.issuer_id.is_none() {
            missing.push("APPSTORE_ISSUER_ID");
        }
        if self.private_key_path.is_none() {
            missing.push("APPSTORE_PRIVATE_KEY_PATH");
        }
        if self.vendor_number.is_none() {
            missing.push("APPSTORE_VENDOR_NUMBER");
        }

        match (
            &self.key_id,
            &self.issuer_id,
            &self.private_key_path,
            &self.vendor_number,
        ) {
            (Some(key_id), Some(issuer_id), Some(path), Some(vendor)) => Ok(Credentials {
                key_id: key_id.clone(),
                issuer_id: issuer_id.clone(),
                private_key_path: path.clone(),
                vendor_number: vendor.clone(),
            }),
            _ => Err(IngestionError::NotConfigured {
                missing: missing.join(", "),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
