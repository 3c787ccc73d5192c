//! # Sales Reports HTTP Transport
//!
//! reqwest implementation of [`ReportTransport`] for
//! `GET {api_base}/salesReports`. Requests pass through a governor limiter
//! before they go out, and each one is bounded by the caller's deadline.

use crate::domain::entities::report::ReportRequest;
use crate::domain::errors::IngestionError;
use crate::domain::repositories::report_transport::{ReportTransport, TransportResponse};
use crate::rate_limit::{self, ApiRateLimiter, RateLimiterConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const GZIP_MEDIA_TYPE: &str = "application/a-gzip";

pub struct HttpReportTransport {
    client: Client,
    api_base: String,
    limiter: ApiRateLimiter,
}

impl HttpReportTransport {
    pub fn new(api_base: &str, requests_per_minute: u32) -> Result<Self, IngestionError> {
        let client = Client::builder()
            .user_agent(concat!("revenue-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestionError::TransportError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            limiter: rate_limit::create_rate_limiter(RateLimiterConfig {
                requests_per_minute,
            }),
        })
    }

    fn reports_url(&self) -> String {
        format!("{}/salesReports", self.api_base)
    }
}

#[async_trait]
impl ReportTransport for HttpReportTransport {
    async fn fetch(
        &self,
        request: &ReportRequest,
        bearer_token: &str,
        deadline: Duration,
    ) -> Result<TransportResponse, IngestionError> {
        rate_limit::acquire(&self.limiter).await;

        let url = self.reports_url();
        debug!(
            "GET {} ({} {} {})",
            url,
            request.report_type,
            request.frequency.as_str(),
            request.formatted_date()
        );

        let response = self
            .client
            .get(&url)
            .query(&request.query_params())
            .header("Authorization", format!("Bearer {}", bearer_token))
            .header("Accept", GZIP_MEDIA_TYPE)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IngestionError::TransportError(format!(
                        "Report request timed out after {:?}",
                        deadline
                    ))
                } else {
                    IngestionError::TransportError(format!("Failed to fetch report: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| IngestionError::TransportError(format!("Failed to read report body: {}", e)))?
            .to_vec();

        Ok(TransportResponse { status, body })
    }
}
