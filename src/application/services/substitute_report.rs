//! Synthetic reports for running without API credentials.
//!
//! Output is marked `ReportSource::Substitute` and goes through the same
//! parse and classify path as live data. The generator is seeded from the
//! request, so the same date and report type always yield the same rows.

use crate::domain::entities::report::{ParsedReport, ReportRequest, ReportSource, ReportType};
use crate::domain::services::classifier::TransactionClassifier;
use crate::domain::services::report_parser::parse_report;
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

const HEADER: &str = "Provider\tSKU\tTitle\tVersion\tProduct Type Identifier\tUnits\tDeveloper Proceeds\tBegin Date\tCountry Code\tCurrency of Proceeds\tApple Identifier\tCustomer Price\tCustomer Currency\tDevice\tSubscription\tPeriod";

struct CatalogEntry {
    sku: &'static str,
    title: &'static str,
    product_type: &'static str,
    apple_id: &'static str,
    price_usd: f64,
    period: &'static str,
}

const CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        sku: "premium.monthly",
        title: "Premium Monthly",
        product_type: "IAY",
        apple_id: "1000000001",
        price_usd: 9.99,
        period: "1 Month",
    },
    CatalogEntry {
        sku: "premium.annual",
        title: "Premium Annual",
        product_type: "IAY",
        apple_id: "1000000002",
        price_usd: 59.99,
        period: "1 Year",
    },
    CatalogEntry {
        sku: "premium.weekly",
        title: "Premium Weekly",
        product_type: "IAY",
        apple_id: "1000000003",
        price_usd: 2.99,
        period: "7 Days",
    },
    CatalogEntry {
        sku: "boost.pack",
        title: "Boost Pack",
        product_type: "IA1",
        apple_id: "1000000004",
        price_usd: 4.99,
        period: "",
    },
];

/// (country, currency, units of currency per USD)
const MARKETS: [(&str, &str, f64); 5] = [
    ("US", "USD", 1.0),
    ("GB", "GBP", 0.79),
    ("DE", "EUR", 0.91),
    ("JP", "JPY", 149.0),
    ("BR", "BRL", 4.95),
];

const DEVICES: [&str; 3] = ["iPhone", "iPad", "Desktop"];

fn seed_for(request: &ReportRequest) -> u64 {
    let day = request.report_date.num_days_from_ce().max(0) as u64;
    let kind = match request.report_type {
        ReportType::Sales => 1,
        ReportType::SubscriptionEvent => 2,
    };
    day.wrapping_mul(31).wrapping_add(kind)
}

/// Builds a tab-separated report body for `request`.
pub fn generate_body(request: &ReportRequest) -> String {
    let mut rng = StdRng::seed_from_u64(seed_for(request));
    let date = request.report_date.format("%m/%d/%Y").to_string();
    let rows = rng.gen_range(8..=20);

    let mut body = String::from(HEADER);
    body.push('\n');

    for _ in 0..rows {
        let product = &CATALOG[rng.gen_range(0..CATALOG.len())];
        let (country, currency, per_usd) = MARKETS[rng.gen_range(0..MARKETS.len())];
        let device = DEVICES[rng.gen_range(0..DEVICES.len())];
        let is_subscription = !product.period.is_empty();

        let refund = rng.gen_bool(0.05);
        let units: i64 = if refund { -1 } else { 1 };
        let price = product.price_usd * per_usd;
        let fee_rate = if is_subscription && rng.gen_bool(0.4) { 0.15 } else { 0.30 };
        let proceeds = price * (1.0 - fee_rate) * units as f64;

        let status = if !is_subscription {
            ""
        } else if rng.gen_bool(0.35) {
            "New"
        } else {
            "Renewal"
        };

        body.push_str(&format!(
            "APPLE\t{sku}\t{title}\t1.0\t{ptype}\t{units}\t{proceeds:.2}\t{date}\t{country}\t{currency}\t{apple_id}\t{price:.2}\t{currency}\t{device}\t{status}\t{period}\n",
            sku = product.sku,
            title = product.title,
            ptype = product.product_type,
            apple_id = product.apple_id,
            period = product.period,
        ));
    }

    body
}

/// Synthetic stand-in for a live report.
pub fn substitute_report(request: &ReportRequest, classifier: &TransactionClassifier) -> ParsedReport {
    let report = parse_report(
        &generate_body(request),
        request,
        classifier,
        ReportSource::Substitute,
    );
    info!(
        "Generated substitute {} report for {} ({} transactions)",
        request.report_type,
        request.formatted_date(),
        report.transactions.len()
    );
    report
}
