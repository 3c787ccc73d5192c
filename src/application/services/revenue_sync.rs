//! # Revenue Sync Service
//!
//! One sync covers one report date: the SALES report first, then
//! SUBSCRIPTION_EVENT, merged with SALES rows winning on duplicate ids.
//! The merged transactions are handed to the attached store, if any.
//!
//! Without credentials the service either reports `NotConfigured` or, when
//! substitute data is allowed, runs on synthetic reports that stay marked as
//! such all the way to storage.

use crate::application::services::report_assembler::ReportAssembler;
use crate::application::services::substitute_report::substitute_report;
use crate::config::IngestionConfig;
use crate::domain::entities::report::{Frequency, ParsedReport, ReportRequest, ReportType};
use crate::domain::errors::IngestionError;
use crate::domain::repositories::transaction_store::{StoreSummary, TransactionStore};
use crate::domain::services::aggregator::merge;
use crate::domain::services::classifier::TransactionClassifier;
use crate::infrastructure::http_transport::HttpReportTransport;
use crate::infrastructure::token_provider::TokenProvider;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub report: ParsedReport,
    pub inserted: usize,
    pub already_present: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyncOutcome {
    /// Credentials are missing and substitute data is disabled.
    NotConfigured { missing: String },
    Completed(SyncSummary),
}

enum ReportSourceMode {
    Live {
        assembler: ReportAssembler,
        vendor_number: String,
    },
    Substitute {
        classifier: TransactionClassifier,
    },
    Unconfigured {
        missing: String,
    },
}

pub struct RevenueSyncService {
    mode: ReportSourceMode,
    store: Option<Arc<dyn TransactionStore>>,
}

impl RevenueSyncService {
    /// Wires the live pipeline when credentials are present.
    ///
    /// # Errors
    /// Key loading and parsing errors surface here rather than on first sync.
    pub fn from_config(config: &IngestionConfig) -> Result<Self, IngestionError> {
        let classifier = TransactionClassifier::new(config.transaction_id_strategy);

        match config.credentials() {
            Ok(credentials) => {
                let tokens = TokenProvider::from_config(config)?;
                let transport =
                    HttpReportTransport::new(&config.api_base, config.requests_per_minute)?;
                let assembler = ReportAssembler::new(
                    Arc::new(tokens),
                    Arc::new(transport),
                    classifier,
                    config.request_timeout(),
                );
                Ok(Self::live(assembler, credentials.vendor_number))
            }
            Err(_) if config.allow_substitute_data => {
                warn!("App Store Connect credentials missing, using substitute report data");
                Ok(Self::substitute(classifier))
            }
            Err(IngestionError::NotConfigured { missing }) => Ok(Self::unconfigured(missing)),
            Err(e) => Err(e),
        }
    }

    pub fn live(assembler: ReportAssembler, vendor_number: impl Into<String>) -> Self {
        Self {
            mode: ReportSourceMode::Live {
                assembler,
                vendor_number: vendor_number.into(),
            },
            store: None,
        }
    }

    pub fn substitute(classifier: TransactionClassifier) -> Self {
        Self {
            mode: ReportSourceMode::Substitute { classifier },
            store: None,
        }
    }

    pub fn unconfigured(missing: impl Into<String>) -> Self {
        Self {
            mode: ReportSourceMode::Unconfigured {
                missing: missing.into(),
            },
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self.mode, ReportSourceMode::Unconfigured { .. })
    }

    pub async fn sync(
        &self,
        date: NaiveDate,
        frequency: Frequency,
    ) -> Result<SyncOutcome, IngestionError> {
        if let ReportSourceMode::Unconfigured { missing } = &self.mode {
            info!("Revenue sync skipped, missing configuration: {}", missing);
            return Ok(SyncOutcome::NotConfigured {
                missing: missing.clone(),
            });
        }

        let sales = self.fetch(ReportType::Sales, date, frequency).await?;
        let events = self
            .fetch(ReportType::SubscriptionEvent, date, frequency)
            .await?;
        let report = merge(&sales, &events);

        let summary = match &self.store {
            Some(store) => store.store_all(&report.transactions, report.mode()).await?,
            None => StoreSummary::default(),
        };

        info!(
            "Revenue sync for {} ({}) complete: {} transactions, net {:.2} USD, {} stored",
            frequency.format_date(date),
            report.source.tag(),
            report.transactions.len(),
            report.totals.net_revenue,
            summary.inserted
        );

        Ok(SyncOutcome::Completed(SyncSummary {
            report,
            inserted: summary.inserted,
            already_present: summary.already_present,
        }))
    }

    async fn fetch(
        &self,
        report_type: ReportType,
        date: NaiveDate,
        frequency: Frequency,
    ) -> Result<ParsedReport, IngestionError> {
        match &self.mode {
            ReportSourceMode::Live {
                assembler,
                vendor_number,
            } => {
                let request = ReportRequest::new(frequency, report_type, date, vendor_number.as_str());
                assembler.assemble(&request).await
            }
            ReportSourceMode::Substitute { classifier } => {
                let request = ReportRequest::new(frequency, report_type, date, "0");
                Ok(substitute_report(&request, classifier))
            }
            ReportSourceMode::Unconfigured { missing } => Err(IngestionError::NotConfigured {
                missing: missing.clone(),
            }),
        }
    }
}
