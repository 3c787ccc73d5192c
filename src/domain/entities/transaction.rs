use crate::domain::value_objects::region::Region;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing period bucket of an auto-renewable subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Weekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Weekly => "weekly",
            SubscriptionType::Monthly => "monthly",
            SubscriptionType::Bimonthly => "bimonthly",
            SubscriptionType::Quarterly => "quarterly",
            SubscriptionType::Semiannual => "semiannual",
            SubscriptionType::Annual => "annual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weekly" => Some(SubscriptionType::Weekly),
            "monthly" => Some(SubscriptionType::Monthly),
            "bimonthly" => Some(SubscriptionType::Bimonthly),
            "quarterly" => Some(SubscriptionType::Quarterly),
            "semiannual" => Some(SubscriptionType::Semiannual),
            "annual" => Some(SubscriptionType::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "subscription")]
    Subscription,
    #[serde(rename = "in-app-purchase")]
    InAppPurchase,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Subscription => "subscription",
            ProductType::InAppPurchase => "in-app-purchase",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "subscription" => Some(ProductType::Subscription),
            "in-app-purchase" => Some(ProductType::InAppPurchase),
            _ => None,
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Monetary breakdown of a transaction, converted to USD.
///
/// All amounts share one sign: refunds are negative across gross, net and fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revenue {
    pub gross_amount: f64,
    pub apple_fee_rate: f64,
    pub apple_fee_amount: f64,
    pub net_amount: f64,
    pub currency: String,
    pub original_currency: String,
    /// Net amount before currency conversion.
    pub original_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub is_new: bool,
    pub subscription_type: Option<SubscriptionType>,
    pub subscription_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub product_id: String,
    pub product_type: ProductType,
    pub quantity: i64,
    pub country_code: String,
    pub region: Region,
    pub device_type: Option<String>,
    pub app_version: Option<String>,
    pub is_refund: bool,
    pub is_renewal: bool,
    pub original_currency: String,
    pub currency_conversion_rate: f64,
}

/// One classified report row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub revenue: Revenue,
    pub customer: Customer,
    pub metadata: TransactionMetadata,
}

impl Transaction {
    pub fn is_refund(&self) -> bool {
        self.metadata.is_refund
    }

    pub fn is_subscription(&self) -> bool {
        self.metadata.product_type == ProductType::Subscription
    }
}
