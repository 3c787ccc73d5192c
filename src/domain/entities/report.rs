use crate::domain::entities::transaction::Transaction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "DAILY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    /// Date format the reporting API expects for this frequency.
    pub fn format_date(&self, date: NaiveDate) -> String {
        match self {
            Frequency::Daily | Frequency::Weekly => date.format("%Y-%m-%d").to_string(),
            Frequency::Monthly => date.format("%Y-%m").to_string(),
            Frequency::Yearly => date.format("%Y").to_string(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    Sales,
    SubscriptionEvent,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Sales => "SALES",
            ReportType::SubscriptionEvent => "SUBSCRIPTION_EVENT",
        }
    }

    /// Report schema version requested when the caller does not pin one.
    pub fn default_version(&self) -> Option<&'static str> {
        match self {
            ReportType::Sales => None,
            ReportType::SubscriptionEvent => Some("1_4"),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportSubType {
    Summary,
}

impl ReportSubType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSubType::Summary => "SUMMARY",
        }
    }
}

/// Parameters of one report fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub frequency: Frequency,
    pub report_type: ReportType,
    pub report_sub_type: ReportSubType,
    pub report_date: NaiveDate,
    pub vendor_number: String,
    pub version: Option<String>,
}

impl ReportRequest {
    pub fn new(
        frequency: Frequency,
        report_type: ReportType,
        report_date: NaiveDate,
        vendor_number: impl Into<String>,
    ) -> Self {
        Self {
            frequency,
            report_type,
            report_sub_type: ReportSubType::Summary,
            report_date,
            vendor_number: vendor_number.into(),
            version: report_type.default_version().map(str::to_string),
        }
    }

    pub fn formatted_date(&self) -> String {
        self.frequency.format_date(self.report_date)
    }

    /// Query string filters in the order the API documents them.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("filter[frequency]", self.frequency.as_str().to_string()),
            ("filter[reportType]", self.report_type.as_str().to_string()),
            (
                "filter[reportSubType]",
                self.report_sub_type.as_str().to_string(),
            ),
            ("filter[reportDate]", self.formatted_date()),
            ("filter[vendorNumber]", self.vendor_number.clone()),
        ];
        if let Some(version) = &self.version {
            params.push(("filter[version]", version.clone()));
        }
        params
    }
}

/// Whether a report reflects real API data or placeholder data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionMode {
    Live,
    Substitute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyReason {
    /// The API has no report for the requested date (HTTP 404).
    NoReportForDate,
    /// The fetch failed; `status` is absent for network-level failures.
    TransportFailed { status: Option<u16> },
}

/// Provenance of a [`ParsedReport`]. Check it before trusting totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSource {
    Api,
    Empty(EmptyReason),
    Substitute,
    Merged(IngestionMode),
}

impl ReportSource {
    pub fn mode(&self) -> IngestionMode {
        match self {
            ReportSource::Api | ReportSource::Empty(_) => IngestionMode::Live,
            ReportSource::Substitute => IngestionMode::Substitute,
            ReportSource::Merged(mode) => *mode,
        }
    }

    /// Short tag used in logs and persisted rows.
    pub fn tag(&self) -> &'static str {
        match self {
            ReportSource::Api => "api",
            ReportSource::Empty(_) => "empty",
            ReportSource::Substitute => "mock",
            ReportSource::Merged(IngestionMode::Live) => "api",
            ReportSource::Merged(IngestionMode::Substitute) => "mock",
        }
    }
}

/// Aggregate figures of a report. Refund rows are kept out of the positive
/// buckets and summed (as absolute value) into `refunds`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub gross_revenue: f64,
    pub apple_fees: f64,
    pub net_revenue: f64,
    pub transaction_count: usize,
    pub new_customer_count: usize,
    pub new_customer_revenue: f64,
    pub subscription_count: usize,
    pub subscription_revenue: f64,
    pub one_time_purchase_count: usize,
    pub one_time_purchase_revenue: f64,
    pub refunds: f64,
    pub refund_count: usize,
    pub average_revenue_per_transaction: f64,
}

/// Result of ingesting one report (or merging two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReport {
    pub report_date: NaiveDate,
    pub frequency: Frequency,
    pub report_type: Option<ReportType>,
    pub source: ReportSource,
    pub transactions: Vec<Transaction>,
    pub totals: Totals,
    /// Data rows seen, header excluded.
    pub row_count: usize,
    /// Rows that failed classification.
    pub skipped_rows: usize,
    /// Rows filtered out as not revenue-bearing.
    pub excluded_rows: usize,
}

impl ParsedReport {
    pub fn empty(request: &ReportRequest, reason: EmptyReason) -> Self {
        Self {
            report_date: request.report_date,
            frequency: request.frequency,
            report_type: Some(request.report_type),
            source: ReportSource::Empty(reason),
            transactions: Vec::new(),
            totals: Totals::default(),
            row_count: 0,
            skipped_rows: 0,
            excluded_rows: 0,
        }
    }

    pub fn mode(&self) -> IngestionMode {
        self.source.mode()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_date_format_per_frequency() {
        let day = date(2024, 3, 9);
        assert_eq!(Frequency::Daily.format_date(day), "2024-03-09");
        assert_eq!(Frequency::Weekly.format_date(day), "2024-03-09");
        assert_eq!(Frequency::Monthly.format_date(day), "2024-03");
        assert_eq!(Frequency::Yearly.format_date(day), "2024");
    }

    #[test]
    fn test_sales_request_has_no_version_filter() {
        let request = ReportRequest::new(Frequency::Daily, ReportType::Sales, date(2024, 1, 15), "8765");
        let params = request.query_params();
        assert_eq!(params.len(), 5);
        assert!(params.contains(&("filter[reportType]", "SALES".to_string())));
        assert!(params.contains(&("filter[reportSubType]", "SUMMARY".to_string())));
        assert!(params.contains(&("filter[vendorNumber]", "8765".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "filter[version]"));
    }

    #[test]
    fn test_subscription_event_request_pins_version() {
        let request = ReportRequest::new(
            Frequency::Daily,
            ReportType::SubscriptionEvent,
            date(2024, 1, 15),
            "8765",
        );
        let params = request.query_params();
        assert!(params.contains(&("filter[reportType]", "SUBSCRIPTION_EVENT".to_string())));
        assert!(params.contains(&("filter[version]", "1_4".to_string())));
    }

    #[test]
    fn test_source_mode() {
        assert_eq!(ReportSource::Api.mode(), IngestionMode::Live);
        assert_eq!(
            ReportSource::Empty(EmptyReason::NoReportForDate).mode(),
            IngestionMode::Live
        );
        assert_eq!(ReportSource::Substitute.mode(), IngestionMode::Substitute);
        assert_eq!(ReportSource::Substitute.tag(), "mock");
        assert_eq!(
            ReportSource::Merged(IngestionMode::Substitute).mode(),
            IngestionMode::Substitute
        );
    }

    #[test]
    fn test_frequency_parse() {
        assert_eq!(Frequency::parse("weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse(" MONTHLY "), Some(Frequency::Monthly));
        assert_eq!(Frequency::parse("hourly"), None);
    }
}
