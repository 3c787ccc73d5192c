//! Report Transport Trait
//!
//! Boundary to the reporting API. Implementations apply their own rate
//! limiting and must honour the caller's deadline. They return every HTTP
//! status as data; interpreting 404 or 5xx is the caller's job.

use crate::domain::entities::report::ReportRequest;
use crate::domain::errors::IngestionError;
use async_trait::async_trait;
use std::time::Duration;

/// Raw HTTP outcome of a report fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Fetches one report. Errors are network-level only (connect, timeout).
    async fn fetch(
        &self,
        request: &ReportRequest,
        bearer_token: &str,
        deadline: Duration,
    ) -> Result<TransportResponse, IngestionError>;
}
