//! Database Models

use super::DatabaseError;
use crate::domain::entities::transaction::{
    Customer, ProductType, Revenue, SubscriptionType, Transaction, TransactionMetadata,
};
use crate::domain::value_objects::region::Region;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transaction record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub gross_amount: f64,
    pub apple_fee_rate: f64,
    pub apple_fee_amount: f64,
    pub net_amount: f64,
    pub currency: String,
    pub original_currency: String,
    pub original_amount: f64,
    pub currency_conversion_rate: f64,
    pub is_new: bool,
    pub subscription_type: Option<String>,
    pub subscription_id: Option<String>,
    pub product_id: String,
    pub product_type: String, // "subscription" or "in-app-purchase"
    pub quantity: i64,
    pub country_code: String,
    pub region: String,
    pub device_type: Option<String>,
    pub app_version: Option<String>,
    pub is_refund: bool,
    pub is_renewal: bool,
    pub source: String, // "api" or "mock"
    pub created_at: DateTime<Utc>,
}

/// Values for a new transaction row
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub transaction: &'a Transaction,
    pub source: &'static str,
}

impl TransactionRecord {
    /// Rebuilds the domain transaction from its stored form.
    pub fn into_transaction(self) -> Result<Transaction, DatabaseError> {
        let corrupt = |reason: String| DatabaseError::CorruptRecord {
            id: self.transaction_id.clone(),
            reason,
        };

        let product_type = ProductType::parse(&self.product_type)
            .ok_or_else(|| corrupt(format!("unknown product type {:?}", self.product_type)))?;
        let region = Region::parse(&self.region)
            .ok_or_else(|| corrupt(format!("unknown region {:?}", self.region)))?;
        let subscription_type = match &self.subscription_type {
            Some(value) => Some(
                SubscriptionType::parse(value)
                    .ok_or_else(|| corrupt(format!("unknown subscription type {:?}", value)))?,
            ),
            None => None,
        };

        Ok(Transaction {
            transaction_id: self.transaction_id,
            transaction_date: self.transaction_date,
            revenue: Revenue {
                gross_amount: self.gross_amount,
                apple_fee_rate: self.apple_fee_rate,
                apple_fee_amount: self.apple_fee_amount,
                net_amount: self.net_amount,
                currency: self.currency,
                original_currency: self.original_currency.clone(),
                original_amount: self.original_amount,
            },
            customer: Customer {
                is_new: self.is_new,
                subscription_type,
                subscription_id: self.subscription_id,
            },
            metadata: TransactionMetadata {
                product_id: self.product_id,
                product_type,
                quantity: self.quantity,
                country_code: self.country_code,
                region,
                device_type: self.device_type,
                app_version: self.app_version,
                is_refund: self.is_refund,
                is_renewal: self.is_renewal,
                original_currency: self.original_currency,
                currency_conversion_rate: self.currency_conversion_rate,
            },
        })
    }
}
