use crate::domain::errors::IngestionError;
use async_trait::async_trait;

/// Supplies bearer tokens for the reporting API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, IngestionError>;
}
