//! Decompressed report text → [`ParsedReport`].

use crate::domain::entities::report::{ParsedReport, ReportRequest, ReportSource};
use crate::domain::services::aggregator::compute_totals;
use crate::domain::services::classifier::{Classification, TransactionClassifier};
use crate::domain::services::column_schema;
use crate::domain::services::tabular_parser::{is_blank, parse_line};
use tracing::{debug, warn};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Parses a full report body. The first non-blank line is the header; every
/// following non-blank line is one data row. Rows that fail classification
/// are logged and counted in `skipped_rows`; they never abort the report.
pub fn parse_report(
    text: &str,
    request: &ReportRequest,
    classifier: &TransactionClassifier,
    source: ReportSource,
) -> ParsedReport {
    let mut lines = text.lines().filter(|line| !is_blank(line));

    let mut report = ParsedReport {
        report_date: request.report_date,
        frequency: request.frequency,
        report_type: Some(request.report_type),
        source,
        transactions: Vec::new(),
        totals: Default::default(),
        row_count: 0,
        skipped_rows: 0,
        excluded_rows: 0,
    };

    let Some(header_line) = lines.next() else {
        warn!(
            "{} report for {} has no header row",
            request.report_type,
            request.formatted_date()
        );
        return report;
    };

    let header = parse_line(header_line.trim_start_matches(BYTE_ORDER_MARK));
    let columns = column_schema::resolve(&header);
    let unresolved = columns.unresolved();
    if !unresolved.is_empty() {
        debug!(
            "{} report header has no column for {:?}",
            request.report_type, unresolved
        );
    }

    for (row_number, line) in lines.enumerate() {
        report.row_count += 1;
        let fields = parse_line(line);

        match classifier.classify(&fields, &columns, request.report_date, row_number) {
            Ok(Classification::Accepted(tx)) => report.transactions.push(*tx),
            Ok(Classification::Excluded(reason)) => {
                debug!("Row {} excluded: {:?}", row_number + 1, reason);
                report.excluded_rows += 1;
            }
            Err(e) => {
                warn!("Skipping row {} of {} report: {}", row_number + 1, request.report_type, e);
                report.skipped_rows += 1;
            }
        }
    }

    report.totals = compute_totals(&report.transactions);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::report::{Frequency, ReportType};
    use crate::domain::entities::transaction::{ProductType, SubscriptionType};
    use chrono::NaiveDate;

    fn request() -> ReportRequest {
        ReportRequest::new(
            Frequency::Daily,
            ReportType::Sales,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            "8765",
        )
    }

    fn parse(text: &str) -> ParsedReport {
        parse_report(
            text,
            &request(),
            &TransactionClassifier::default(),
            ReportSource::Api,
        )
    }

    #[test]
    fn test_end_to_end_single_row() {
        let text = "Units\tCustomer Price\tDeveloper Proceeds\tProduct Type Identifier\tCountry Code\tCurrency of Proceeds\tSubscription\tPeriod\tTitle\tSKU\n1\t9.99\t8.49\t1C\tUS\tUSD\tNew\t1 Month\tBlush Premium\tsku123\n";
        let report = parse(text);

        assert_eq!(report.row_count, 1);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.transactions.len(), 1);
        let tx = &report.transactions[0];
        assert_eq!(tx.metadata.product_type, ProductType::Subscription);
        assert_eq!(tx.customer.subscription_type, Some(SubscriptionType::Monthly));
        assert!(tx.customer.is_new);
        assert!((tx.revenue.net_amount - 8.49).abs() < 1e-9);
        assert!((tx.revenue.gross_amount - 9.99).abs() < 1e-9);
        assert!((report.totals.net_revenue - 8.49).abs() < 1e-9);
    }

    #[test]
    fn test_counts_excluded_and_skipped_rows() {
        let text = "Units\tDeveloper Proceeds\tCustomer Price\tSKU\n\
                    1\t8.49\t9.99\ta\n\
                    0\t8.49\t9.99\tb\n\
                    x\t8.49\t9.99\tc\n\
                    \n\
                    2\t3.38\t1.99\td\n";
        let report = parse(text);
        assert_eq!(report.row_count, 4);
        assert_eq!(report.excluded_rows, 1);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.transactions[0].metadata.product_id, "a");
        assert_eq!(report.transactions[1].metadata.product_id, "d");
    }

    #[test]
    fn test_header_with_byte_order_mark_and_crlf() {
        let text = "\u{feff}Units\tDeveloper Proceeds\tSKU\r\n1\t8.49\ta\r\n";
        let report = parse(text);
        assert_eq!(report.transactions.len(), 1);
        assert!((report.transactions[0].revenue.net_amount - 8.49).abs() < 1e-9);
    }

    #[test]
    fn test_quoted_title_keeps_columns_aligned() {
        let text = "Title\tUnits\tDeveloper Proceeds\tSKU\n\"Blush\tDating\"\t1\t8.49\tsku1\n";
        let report = parse(text);
        assert_eq!(report.skipped_rows, 0);
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].metadata.product_id, "sku1");
    }

    #[test]
    fn test_empty_body() {
        let report = parse("");
        assert_eq!(report.row_count, 0);
        assert!(report.is_empty());
        assert_eq!(report.source, ReportSource::Api);
    }
}
