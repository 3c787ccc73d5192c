//! Totals and cross-report deduplication.

use crate::domain::entities::report::{IngestionMode, ParsedReport, ReportSource, Totals};
use crate::domain::entities::transaction::Transaction;
use std::collections::HashSet;
use tracing::debug;

/// Sums `transactions` into [`Totals`]. Refunds go to `refunds` (absolute
/// net value) and stay out of every positive bucket.
pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();

    for tx in transactions {
        if tx.is_refund() {
            totals.refunds += tx.revenue.net_amount.abs();
            totals.refund_count += 1;
            continue;
        }

        let net = tx.revenue.net_amount;
        totals.gross_revenue += tx.revenue.gross_amount;
        totals.apple_fees += tx.revenue.apple_fee_amount;
        totals.net_revenue += net;
        totals.transaction_count += 1;

        if tx.customer.is_new {
            totals.new_customer_count += 1;
            totals.new_customer_revenue += net;
        }

        if tx.is_subscription() {
            totals.subscription_count += 1;
            totals.subscription_revenue += net;
        } else {
            totals.one_time_purchase_count += 1;
            totals.one_time_purchase_revenue += net;
        }
    }

    if totals.transaction_count > 0 {
        totals.average_revenue_per_transaction =
            totals.net_revenue / totals.transaction_count as f64;
    }

    totals
}

/// Merges two reports covering overlapping transactions.
///
/// Transactions are deduplicated by id with the first occurrence winning, so
/// `first` should be the SALES report. Totals are recomputed from the
/// deduplicated set, never summed from the inputs.
pub fn merge(first: &ParsedReport, second: &ParsedReport) -> ParsedReport {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut transactions = Vec::with_capacity(first.transactions.len() + second.transactions.len());
    let mut duplicates = 0usize;

    for tx in first.transactions.iter().chain(second.transactions.iter()) {
        if seen.insert(tx.transaction_id.as_str()) {
            transactions.push(tx.clone());
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        debug!("Dropped {} duplicate transactions while merging", duplicates);
    }

    let mode = if first.mode() == IngestionMode::Substitute
        || second.mode() == IngestionMode::Substitute
    {
        IngestionMode::Substitute
    } else {
        IngestionMode::Live
    };

    let totals = compute_totals(&transactions);

    ParsedReport {
        report_date: first.report_date,
        frequency: first.frequency,
        report_type: None,
        source: ReportSource::Merged(mode),
        transactions,
        totals,
        row_count: first.row_count + second.row_count,
        skipped_rows: first.skipped_rows + second.skipped_rows,
        excluded_rows: first.excluded_rows + second.excluded_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::report::{EmptyReason, Frequency, ReportType};
    use crate::domain::entities::transaction::{
        Customer, ProductType, Revenue, SubscriptionType, TransactionMetadata,
    };
    use crate::domain::value_objects::region::Region;
    use chrono::NaiveDate;

    const TOLERANCE: f64 = 1e-9;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn tx(id: &str, gross: f64, net: f64, subscription: bool, is_new: bool) -> Transaction {
        let is_refund = net < 0.0;
        Transaction {
            transaction_id: id.to_string(),
            transaction_date: date(),
            revenue: Revenue {
                gross_amount: gross,
                apple_fee_rate: if gross == 0.0 { 0.15 } else { (gross - net) / gross.abs() },
                apple_fee_amount: gross - net,
                net_amount: net,
                currency: "USD".to_string(),
                original_currency: "USD".to_string(),
                original_amount: net,
            },
            customer: Customer {
                is_new,
                subscription_type: subscription.then_some(SubscriptionType::Monthly),
                subscription_id: None,
            },
            metadata: TransactionMetadata {
                product_id: "sku".to_string(),
                product_type: if subscription {
                    ProductType::Subscription
                } else {
                    ProductType::InAppPurchase
                },
                quantity: if is_refund { -1 } else { 1 },
                country_code: "US".to_string(),
                region: Region::NorthAmerica,
                device_type: None,
                app_version: None,
                is_refund,
                is_renewal: !is_new,
                original_currency: "USD".to_string(),
                currency_conversion_rate: 1.0,
            },
        }
    }

    fn report(report_type: ReportType, transactions: Vec<Transaction>) -> ParsedReport {
        let totals = compute_totals(&transactions);
        ParsedReport {
            report_date: date(),
            frequency: Frequency::Daily,
            report_type: Some(report_type),
            source: ReportSource::Api,
            row_count: transactions.len(),
            transactions,
            totals,
            skipped_rows: 0,
            excluded_rows: 0,
        }
    }

    fn sales() -> ParsedReport {
        report(
            ReportType::Sales,
            vec![
                tx("a", 9.99, 8.49, true, true),
                tx("b", 1.99, 1.69, false, true),
                tx("r", -9.99, -8.49, true, false),
            ],
        )
    }

    fn events() -> ParsedReport {
        report(
            ReportType::SubscriptionEvent,
            vec![tx("a", 9.99, 8.49, true, true), tx("c", 49.99, 42.49, true, false)],
        )
    }

    fn assert_consistent(report: &ParsedReport) {
        let totals = &report.totals;
        assert!((totals.net_revenue - (totals.gross_revenue - totals.apple_fees)).abs() < TOLERANCE);
        assert_eq!(
            totals.transaction_count,
            report.transactions.len() - totals.refund_count
        );
    }

    #[test]
    fn test_totals_buckets() {
        let totals = sales().totals;
        assert_eq!(totals.transaction_count, 2);
        assert_eq!(totals.refund_count, 1);
        assert!((totals.refunds - 8.49).abs() < TOLERANCE);
        assert!((totals.gross_revenue - 11.98).abs() < TOLERANCE);
        assert!((totals.net_revenue - 10.18).abs() < TOLERANCE);
        assert!((totals.apple_fees - 1.80).abs() < TOLERANCE);
        assert_eq!(totals.subscription_count, 1);
        assert!((totals.subscription_revenue - 8.49).abs() < TOLERANCE);
        assert_eq!(totals.one_time_purchase_count, 1);
        assert!((totals.one_time_purchase_revenue - 1.69).abs() < TOLERANCE);
        assert_eq!(totals.new_customer_count, 2);
        assert!((totals.average_revenue_per_transaction - 5.09).abs() < TOLERANCE);
    }

    #[test]
    fn test_empty_totals() {
        let totals = compute_totals(&[]);
        assert_eq!(totals, Totals::default());
        assert_eq!(totals.average_revenue_per_transaction, 0.0);
    }

    #[test]
    fn test_merge_drops_duplicates_first_wins() {
        let merged = merge(&sales(), &events());
        let ids: Vec<&str> = merged
            .transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "r", "c"]);
        assert_eq!(merged.totals.transaction_count, 3);
        assert!((merged.totals.net_revenue - (8.49 + 1.69 + 42.49)).abs() < TOLERANCE);
        assert_eq!(merged.source, ReportSource::Merged(IngestionMode::Live));
        assert_eq!(merged.row_count, 5);
        assert_consistent(&merged);
    }

    #[test]
    fn test_merge_does_not_sum_input_totals() {
        let a = sales();
        let b = events();
        let merged = merge(&a, &b);
        let naive = a.totals.net_revenue + b.totals.net_revenue;
        assert!(merged.totals.net_revenue < naive);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = sales();
        let once = merge(&a, &events());
        let twice = merge(&a, &once);
        assert_eq!(twice.totals, once.totals);
        assert_eq!(twice.transactions, once.transactions);
    }

    #[test]
    fn test_merge_with_empty_report() {
        let a = sales();
        let request = crate::domain::entities::report::ReportRequest::new(
            Frequency::Daily,
            ReportType::SubscriptionEvent,
            date(),
            "1",
        );
        let empty = ParsedReport::empty(&request, EmptyReason::NoReportForDate);
        let merged = merge(&a, &empty);
        assert_eq!(merged.totals, a.totals);
        assert_eq!(merged.transactions, a.transactions);
    }

    #[test]
    fn test_merge_mode_is_substitute_if_any_input_is() {
        let a = sales();
        let mut b = events();
        b.source = ReportSource::Substitute;
        assert_eq!(merge(&a, &b).mode(), IngestionMode::Substitute);
    }
}
