//! # Report Assembler
//!
//! Runs one report fetch end to end: sign a token, call the transport,
//! decompress, parse and classify, aggregate.
//!
//! ## Outcome mapping
//! - token failure → error (the caller cannot do anything without a key)
//! - HTTP 404 → empty report, `Empty(NoReportForDate)`
//! - any other non-2xx or a network failure → empty report, `Empty(TransportFailed)`
//! - 2xx → parsed report, `Api`; a corrupt payload is an error

use crate::domain::entities::report::{EmptyReason, ParsedReport, ReportRequest, ReportSource};
use crate::domain::errors::IngestionError;
use crate::domain::repositories::report_transport::ReportTransport;
use crate::domain::repositories::token_source::TokenSource;
use crate::domain::services::classifier::TransactionClassifier;
use crate::domain::services::report_parser::parse_report;
use crate::infrastructure::gzip_codec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Longest response body excerpt included in warnings.
const BODY_EXCERPT_LEN: usize = 200;

pub struct ReportAssembler {
    tokens: Arc<dyn TokenSource>,
    transport: Arc<dyn ReportTransport>,
    classifier: TransactionClassifier,
    deadline: Duration,
}

impl ReportAssembler {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        transport: Arc<dyn ReportTransport>,
        classifier: TransactionClassifier,
        deadline: Duration,
    ) -> Self {
        Self {
            tokens,
            transport,
            classifier,
            deadline,
        }
    }

    pub async fn assemble(&self, request: &ReportRequest) -> Result<ParsedReport, IngestionError> {
        let token = self.tokens.token().await?;

        let response = match self.transport.fetch(request, &token, self.deadline).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "{} report for {} unavailable: {}",
                    request.report_type,
                    request.formatted_date(),
                    e
                );
                return Ok(ParsedReport::empty(
                    request,
                    EmptyReason::TransportFailed { status: None },
                ));
            }
        };

        if response.is_not_found() {
            info!(
                "No {} report published for {}",
                request.report_type,
                request.formatted_date()
            );
            return Ok(ParsedReport::empty(request, EmptyReason::NoReportForDate));
        }

        if !response.is_success() {
            let excerpt: String = String::from_utf8_lossy(&response.body)
                .chars()
                .take(BODY_EXCERPT_LEN)
                .collect();
            warn!(
                "{} report request for {} failed with HTTP {}: {}",
                request.report_type,
                request.formatted_date(),
                response.status,
                excerpt
            );
            return Ok(ParsedReport::empty(
                request,
                EmptyReason::TransportFailed {
                    status: Some(response.status),
                },
            ));
        }

        let text = gzip_codec::decompress(&response.body)?;
        let report = parse_report(&text, request, &self.classifier, ReportSource::Api);

        info!(
            "{} report for {}: {} rows, {} transactions, {} excluded, {} skipped, net {:.2} USD",
            request.report_type,
            request.formatted_date(),
            report.row_count,
            report.transactions.len(),
            report.excluded_rows,
            report.skipped_rows,
            report.totals.net_revenue
        );

        Ok(report)
    }
}
