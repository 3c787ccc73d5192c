use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter configuration
pub struct RateLimiterConfig {
    /// Maximum outbound requests per minute
    pub requests_per_minute: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
        }
    }
}

/// Shared limiter for outbound report requests
pub type ApiRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new rate limiter. A zero rate is raised to one request per minute.
pub fn create_rate_limiter(config: RateLimiterConfig) -> ApiRateLimiter {
    let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}

/// Waits until the limiter admits one more request.
pub async fn acquire(limiter: &ApiRateLimiter) {
    if limiter.check().is_err() {
        tracing::debug!("Report API rate limit reached, waiting for capacity");
        limiter.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_rate_limiter(RateLimiterConfig {
            requests_per_minute: 2,
        });

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let limiter = create_rate_limiter(RateLimiterConfig {
            requests_per_minute: 0,
        });
        assert!(limiter.check().is_ok());
    }

    #[test]
    fn test_default_config() {
        assert_eq!(RateLimiterConfig::default().requests_per_minute, 60);
    }

    #[tokio::test]
    async fn test_acquire_within_quota_does_not_block() {
        let limiter = create_rate_limiter(RateLimiterConfig::default());
        tokio::time::timeout(std::time::Duration::from_millis(100), acquire(&limiter))
            .await
            .unwrap();
    }
}
