//! Row classification: turns one report row into a typed [`Transaction`].
//!
//! Developer proceeds in the report are already the row total, while customer
//! price is per unit. Gross is therefore `price * |units|` and net is the
//! proceeds value as-is; multiplying proceeds by units double-counts every
//! multi-unit row.

use crate::domain::entities::transaction::{
    Customer, ProductType, Revenue, SubscriptionType, Transaction, TransactionMetadata,
};
use crate::domain::errors::RowError;
use crate::domain::services::column_schema::{ColumnIndexMap, ColumnRole};
use crate::domain::value_objects::currency::{self, BASE_CURRENCY};
use crate::domain::value_objects::region::Region;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Product type identifiers for free updates. Never revenue-bearing.
const FREE_UPDATE_CODES: &[&str] = &["7", "7F", "7T", "F7"];

/// Product type identifiers for auto-renewable and non-renewing subscriptions.
const SUBSCRIPTION_CODES: &[&str] = &["IAY", "IAC", "IAY-M", "IAC-M"];

/// Platform fee rate assumed when the gross amount is zero.
pub const DEFAULT_FEE_RATE: f64 = 0.15;

/// How the suffix of a synthesized transaction id is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionIdStrategy {
    /// Random hex suffix. Re-fetching a report yields new ids.
    Random,
    /// Hash of the row content and position. Stable across re-fetches.
    ContentHash,
}

impl TransactionIdStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "random" => Some(TransactionIdStrategy::Random),
            "content_hash" | "contenthash" | "hash" => Some(TransactionIdStrategy::ContentHash),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    FreeUpdate,
    ZeroUnits,
    ZeroRevenue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Accepted(Box<Transaction>),
    Excluded(ExclusionReason),
}

/// Raw values of one row, already looked up by role.
#[derive(Debug)]
struct RawRow<'a> {
    units: f64,
    customer_price: f64,
    developer_proceeds: f64,
    product_type: &'a str,
    subscription_status: &'a str,
    period: &'a str,
    country_code: &'a str,
    customer_currency: &'a str,
    proceeds_currency: &'a str,
    title: &'a str,
    sku: &'a str,
    apple_identifier: &'a str,
    parent_identifier: &'a str,
    device: &'a str,
    version: &'a str,
}

impl<'a> RawRow<'a> {
    fn extract(fields: &'a [String], columns: &ColumnIndexMap) -> Result<Self, RowError> {
        let text = |role| columns.value(role, fields);

        // Each side falls back to the other currency column, then USD
        let first_currency = |roles: [ColumnRole; 2]| {
            roles
                .into_iter()
                .map(text)
                .find(|c| !c.is_empty())
                .unwrap_or(BASE_CURRENCY)
        };
        let customer_currency =
            first_currency([ColumnRole::CustomerCurrency, ColumnRole::ProceedsCurrency]);
        let proceeds_currency =
            first_currency([ColumnRole::ProceedsCurrency, ColumnRole::CustomerCurrency]);

        Ok(Self {
            units: parse_amount("units", text(ColumnRole::Units))?,
            customer_price: parse_amount("customer_price", text(ColumnRole::CustomerPrice))?,
            developer_proceeds: parse_amount(
                "developer_proceeds",
                text(ColumnRole::DeveloperProceeds),
            )?,
            product_type: text(ColumnRole::ProductType),
            subscription_status: text(ColumnRole::Subscription),
            period: text(ColumnRole::Period),
            country_code: text(ColumnRole::CountryCode),
            customer_currency,
            proceeds_currency,
            title: text(ColumnRole::Title),
            sku: text(ColumnRole::Sku),
            apple_identifier: text(ColumnRole::AppleIdentifier),
            parent_identifier: text(ColumnRole::ParentIdentifier),
            device: text(ColumnRole::Device),
            version: text(ColumnRole::Version),
        })
    }
}

/// Parses a report number after stripping currency symbols, thousands
/// separators and whitespace. Empty input is zero.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<f64, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Maps a free-text period ("1 Month", "7 Days", "1 Year") to a subscription
/// bucket. Unrecognized periods return `None`.
pub fn normalize_period(period: &str) -> Option<SubscriptionType> {
    let lower = period.to_lowercase();

    let unit = if lower.contains("year") || lower.contains("annual") {
        PeriodUnit::Year
    } else if lower.contains("month") {
        PeriodUnit::Month
    } else if lower.contains("week") {
        PeriodUnit::Week
    } else if lower.contains("day") {
        PeriodUnit::Day
    } else {
        return None;
    };

    let digits: String = lower.chars().filter(|c| c.is_ascii_digit()).collect();
    let count: u32 = if digits.is_empty() {
        1
    } else {
        digits.parse().ok()?
    };

    match (count, unit) {
        (7, PeriodUnit::Day) | (1, PeriodUnit::Week) => Some(SubscriptionType::Weekly),
        (1, PeriodUnit::Month) => Some(SubscriptionType::Monthly),
        (2, PeriodUnit::Month) => Some(SubscriptionType::Bimonthly),
        (3, PeriodUnit::Month) => Some(SubscriptionType::Quarterly),
        (6, PeriodUnit::Month) => Some(SubscriptionType::Semiannual),
        (12, PeriodUnit::Month) | (1, PeriodUnit::Year) => Some(SubscriptionType::Annual),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Business rules that classify report rows into transactions.
#[derive(Debug, Clone)]
pub struct TransactionClassifier {
    id_strategy: TransactionIdStrategy,
}

impl Default for TransactionClassifier {
    fn default() -> Self {
        Self::new(TransactionIdStrategy::Random)
    }
}

impl TransactionClassifier {
    pub fn new(id_strategy: TransactionIdStrategy) -> Self {
        Self { id_strategy }
    }

    /// Classifies one data row. `row_number` is the row's position among the
    /// report's data rows and only feeds content-hash ids.
    pub fn classify(
        &self,
        fields: &[String],
        columns: &ColumnIndexMap,
        report_date: NaiveDate,
        row_number: usize,
    ) -> Result<Classification, RowError> {
        let row = RawRow::extract(fields, columns)?;
        let product_code = row.product_type.to_uppercase();

        if FREE_UPDATE_CODES.contains(&product_code.as_str()) {
            return Ok(Classification::Excluded(ExclusionReason::FreeUpdate));
        }
        if row.units == 0.0 {
            return Ok(Classification::Excluded(ExclusionReason::ZeroUnits));
        }

        let gross_magnitude = (row.customer_price * row.units.abs()).abs();
        let net_magnitude = row.developer_proceeds.abs();
        if gross_magnitude <= 0.0 && net_magnitude <= 0.0 {
            return Ok(Classification::Excluded(ExclusionReason::ZeroRevenue));
        }

        let is_subscription = SUBSCRIPTION_CODES.contains(&product_code.as_str())
            || !row.subscription_status.is_empty();

        let status = row.subscription_status.to_lowercase();
        let is_new_subscription = status == "new";
        let is_renewal = status == "renewal";
        let is_new = is_new_subscription || !is_renewal;

        let is_refund = row.units < 0.0 || row.developer_proceeds < 0.0;
        let sign = if is_refund { -1.0 } else { 1.0 };

        // Gross is in the customer currency, net in the proceeds currency
        let original_currency = row.proceeds_currency.to_uppercase();
        let customer_currency = row.customer_currency.to_uppercase();
        for code in [&original_currency, &customer_currency] {
            if !currency::is_known_currency(code) {
                debug!("No USD rate for currency {}, converting at par", code);
            }
        }

        let original_net = sign * net_magnitude;
        let (net, rate) = currency::to_usd(original_net, &original_currency);
        let (gross, _) = currency::to_usd(sign * gross_magnitude, &customer_currency);
        let fee = gross - net;
        let fee_rate = if gross == 0.0 {
            DEFAULT_FEE_RATE
        } else {
            fee / gross.abs()
        };

        let subscription_type = if is_subscription {
            Some(normalize_period(row.period).unwrap_or(SubscriptionType::Monthly))
        } else {
            None
        };

        let country_code = row.country_code.to_uppercase();
        let region = Region::from_country_code(&country_code);

        let product_id = [row.sku, row.apple_identifier, row.title]
            .into_iter()
            .find(|v| !v.is_empty())
            .unwrap_or_default()
            .to_string();

        let subscription_id = if is_subscription {
            [row.apple_identifier, row.parent_identifier, row.sku]
                .into_iter()
                .find(|v| !v.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        let transaction_id = self.transaction_id(&row, report_date, row_number);

        Ok(Classification::Accepted(Box::new(Transaction {
            transaction_id,
            transaction_date: report_date,
            revenue: Revenue {
                gross_amount: gross,
                apple_fee_rate: fee_rate,
                apple_fee_amount: fee,
                net_amount: net,
                currency: BASE_CURRENCY.to_string(),
                original_currency: original_currency.clone(),
                original_amount: original_net,
            },
            customer: Customer {
                is_new,
                subscription_type,
                subscription_id,
            },
            metadata: TransactionMetadata {
                product_id,
                product_type: if is_subscription {
                    ProductType::Subscription
                } else {
                    ProductType::InAppPurchase
                },
                quantity: row.units.round() as i64,
                country_code,
                region,
                device_type: non_empty(row.device).map(str::to_string),
                app_version: non_empty(row.version).map(str::to_string),
                is_refund,
                is_renewal,
                original_currency,
                currency_conversion_rate: rate,
            },
        })))
    }

    fn transaction_id(&self, row: &RawRow<'_>, report_date: NaiveDate, row_number: usize) -> String {
        let key = [row.sku, row.title]
            .into_iter()
            .find(|v| !v.is_empty())
            .unwrap_or("unknown")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");

        let suffix = match self.id_strategy {
            TransactionIdStrategy::Random => format!("{:016x}", rand::random::<u64>()),
            TransactionIdStrategy::ContentHash => {
                let mut hasher = Sha256::new();
                hasher.update(report_date.to_string());
                for part in [row.sku, row.title, row.country_code] {
                    hasher.update([0u8]);
                    hasher.update(part.as_bytes());
                }
                hasher.update(row.units.to_le_bytes());
                hasher.update(row.developer_proceeds.to_le_bytes());
                hasher.update((row_number as u64).to_le_bytes());
                hex::encode(&hasher.finalize()[..8])
            }
        };

        format!("{}_{}_{}", report_date, key, suffix)
    }
}
