use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// How loudly an ingestion error should be surfaced to the scheduling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Nothing to do; not a failure.
    Minor,
    /// The run failed but a later run may succeed without intervention.
    Moderate,
    /// Operator intervention required (bad key, bad configuration).
    Critical,
}

/// Errors produced by the ingestion pipeline.
///
/// Per-row problems are reported separately through [`RowError`] and never
/// abort a report.
#[derive(Debug, Error, Clone)]
pub enum IngestionError {
    #[error("Report ingestion not configured: missing {missing}")]
    NotConfigured { missing: String },

    #[error("Private key not found (searched: {searched:?})")]
    KeyNotFound { searched: Vec<PathBuf> },

    #[error("Invalid private key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Token generation failed: {0}")]
    TokenGenerationFailed(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl IngestionError {
    /// Only transport failures may succeed on a plain retry by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestionError::TransportError(_))
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            IngestionError::NotConfigured { .. } => ErrorSeverity::Minor,
            IngestionError::TransportError(_) => ErrorSeverity::Moderate,
            IngestionError::DecompressionFailed(_) => ErrorSeverity::Moderate,
            IngestionError::Persistence(_) => ErrorSeverity::Moderate,
            IngestionError::KeyNotFound { .. } => ErrorSeverity::Critical,
            IngestionError::InvalidKeyFormat(_) => ErrorSeverity::Critical,
            IngestionError::TokenGenerationFailed(_) => ErrorSeverity::Critical,
        }
    }
}

/// Why a single report row could not be classified. Counted, logged, skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RowError {
    #[error("Invalid numeric value for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}
