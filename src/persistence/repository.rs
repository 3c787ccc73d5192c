//! Database Repository
//!
//! Data access layer for finalized transactions.

use super::models::*;
use super::{DatabaseError, DbPool};
use crate::domain::entities::report::IngestionMode;
use crate::domain::entities::transaction::Transaction;
use crate::domain::errors::IngestionError;
use crate::domain::repositories::transaction_store::{StoreSummary, TransactionStore};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info};

/// Transaction repository
pub struct TransactionRepository {
    pool: DbPool,
}

/// Stored `source` tag for a report mode
pub fn source_tag(mode: IngestionMode) -> &'static str {
    match mode {
        IngestionMode::Live => "api",
        IngestionMode::Substitute => "mock",
    }
}

impl TransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a transaction unless its id is already stored
    ///
    /// Returns `true` when a row was written.
    pub async fn insert_if_absent(&self, new: NewTransaction<'_>) -> Result<bool, DatabaseError> {
        let tx = new.transaction;
        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO transactions (
                transaction_id, transaction_date, gross_amount, apple_fee_rate,
                apple_fee_amount, net_amount, currency, original_currency,
                original_amount, currency_conversion_rate, is_new, subscription_type,
                subscription_id, product_id, product_type, quantity, country_code,
                region, device_type, app_version, is_refund, is_renewal, source, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)
            "#,
        )
        .bind(&tx.transaction_id)
        .bind(tx.transaction_date)
        .bind(tx.revenue.gross_amount)
        .bind(tx.revenue.apple_fee_rate)
        .bind(tx.revenue.apple_fee_amount)
        .bind(tx.revenue.net_amount)
        .bind(&tx.revenue.currency)
        .bind(&tx.revenue.original_currency)
        .bind(tx.revenue.original_amount)
        .bind(tx.metadata.currency_conversion_rate)
        .bind(tx.customer.is_new)
        .bind(tx.customer.subscription_type.map(|s| s.as_str()))
        .bind(&tx.customer.subscription_id)
        .bind(&tx.metadata.product_id)
        .bind(tx.metadata.product_type.as_str())
        .bind(tx.metadata.quantity)
        .bind(&tx.metadata.country_code)
        .bind(tx.metadata.region.as_str())
        .bind(&tx.metadata.device_type)
        .bind(&tx.metadata.app_version)
        .bind(tx.metadata.is_refund)
        .bind(tx.metadata.is_renewal)
        .bind(new.source)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert transaction {}: {}", tx.transaction_id, e);
            DatabaseError::QueryError(format!("Failed to insert transaction: {}", e))
        })?
        .rows_affected();

        if rows_affected == 0 {
            debug!("Transaction {} already stored, skipping", tx.transaction_id);
        }
        Ok(rows_affected > 0)
    }

    /// Insert every transaction that is not stored yet
    pub async fn store_batch(
        &self,
        transactions: &[Transaction],
        mode: IngestionMode,
    ) -> Result<StoreSummary, DatabaseError> {
        let mut summary = StoreSummary::default();

        for tx in transactions {
            let inserted = self
                .insert_if_absent(NewTransaction {
                    transaction: tx,
                    source: source_tag(mode),
                })
                .await?;
            if inserted {
                summary.inserted += 1;
            } else {
                summary.already_present += 1;
            }
        }

        info!(
            "Stored {} new transactions ({} already present)",
            summary.inserted, summary.already_present
        );
        Ok(summary)
    }

    /// Get transaction by ID
    pub async fn get(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions WHERE transaction_id = ?1",
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get transaction {}: {}", transaction_id, e);
            DatabaseError::QueryError(format!("Failed to get transaction: {}", e))
        })?;

        Ok(record)
    }

    /// Transactions for one report date, in insertion order
    pub async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TransactionRecord>, DatabaseError> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            "SELECT * FROM transactions WHERE transaction_date = ?1 ORDER BY rowid",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list transactions for {}: {}", date, e);
            DatabaseError::QueryError(format!("Failed to list transactions: {}", e))
        })?;

        Ok(records)
    }

    /// Total number of stored transactions
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to count transactions: {}", e);
                DatabaseError::QueryError(format!("Failed to count transactions: {}", e))
            })?;

        Ok(result.0)
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    async fn store_all(
        &self,
        transactions: &[Transaction],
        mode: IngestionMode,
    ) -> Result<StoreSummary, IngestionError> {
        self.store_batch(transactions, mode)
            .await
            .map_err(|e| IngestionError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::transaction::{
        Customer, ProductType, Revenue, SubscriptionType, TransactionMetadata,
    };
    use crate::domain::value_objects::region::Region;
    use crate::persistence::init_database;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn transaction(id: &str) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            transaction_date: date(),
            revenue: Revenue {
                gross_amount: 10.989,
                apple_fee_rate: 0.1502,
                apple_fee_amount: 1.65,
                net_amount: 9.339,
                currency: "USD".to_string(),
                original_currency: "EUR".to_string(),
                original_amount: 8.49,
            },
            customer: Customer {
                is_new: true,
                subscription_type: Some(SubscriptionType::Monthly),
                subscription_id: Some("1000000001".to_string()),
            },
            metadata: TransactionMetadata {
                product_id: "sku123".to_string(),
                product_type: ProductType::Subscription,
                quantity: 1,
                country_code: "DE".to_string(),
                region: Region::Europe,
                device_type: Some("iPhone".to_string()),
                app_version: None,
                is_refund: false,
                is_renewal: false,
                original_currency: "EUR".to_string(),
                currency_conversion_rate: 1.10,
            },
        }
    }

    async fn repository() -> TransactionRepository {
        TransactionRepository::new(init_database("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repository().await;
        let tx = transaction("2024-01-15_sku123_0a1b2c3d");

        let inserted = repo
            .insert_if_absent(NewTransaction {
                transaction: &tx,
                source: "api",
            })
            .await
            .unwrap();
        assert!(inserted);

        let record = repo.get(&tx.transaction_id).await.unwrap().unwrap();
        assert_eq!(record.source, "api");
        assert_eq!(record.region, "EU");
        assert_eq!(record.into_transaction().unwrap(), tx);
    }

    #[tokio::test]
    async fn test_existing_ids_are_skipped() {
        let repo = repository().await;
        let first = transaction("a");
        let mut changed = transaction("a");
        changed.revenue.net_amount = 0.01;

        let summary = repo
            .store_batch(&[first.clone(), transaction("b")], IngestionMode::Live)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);

        let summary = repo
            .store_batch(&[changed, transaction("c")], IngestionMode::Live)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.already_present, 1);

        let stored = repo.get("a").await.unwrap().unwrap();
        assert_eq!(stored.net_amount, first.revenue.net_amount);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_by_date_keeps_insertion_order() {
        let repo = repository().await;
        let mut other_day = transaction("z");
        other_day.transaction_date = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();

        repo.store_batch(
            &[transaction("b"), transaction("a"), other_day],
            IngestionMode::Live,
        )
        .await
        .unwrap();

        let ids: Vec<String> = repo
            .list_by_date(date())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.transaction_id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_store_trait_tags_substitute_rows() {
        let repo = repository().await;
        let store: &dyn TransactionStore = &repo;

        let summary = store
            .store_all(&[transaction("m")], IngestionMode::Substitute)
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(repo.get("m").await.unwrap().unwrap().source, "mock");
    }
}
