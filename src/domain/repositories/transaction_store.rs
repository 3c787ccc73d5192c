//! Transaction Store Trait
//!
//! Persistence boundary for finalized transactions. Writes are keyed by
//! `transaction_id` with skip-if-exists semantics, so re-ingesting a report
//! never duplicates rows.

use crate::domain::entities::report::IngestionMode;
use crate::domain::entities::transaction::Transaction;
use crate::domain::errors::IngestionError;
use async_trait::async_trait;

/// Outcome of storing a batch of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub inserted: usize,
    pub already_present: usize,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Stores `transactions`, tagging new rows with the data's provenance.
    async fn store_all(
        &self,
        transactions: &[Transaction],
        mode: IngestionMode,
    ) -> Result<StoreSummary, IngestionError>;
}
