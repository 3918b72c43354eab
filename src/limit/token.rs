//! Token-bucket rate limiter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::Result;
use crate::store::{BucketStore, VERDICT_ALLOWED};

use super::backend::Limiter;
use super::unix_now_ms;

/// A rate limiter that admits requests against a pool of tokens.
///
/// Tokens regenerate continuously at `rate` per second up to `capacity`;
/// each admitted request consumes one. Unlike the leaky bucket this permits
/// bursts: after a long enough idle period, `floor(capacity)` requests are
/// admitted back to back before the rate bound takes over.
///
/// The bucket starts full, so a cold key with `capacity >= 1` always admits
/// the first request.
pub struct TokenBucketLimiter {
    store: Arc<dyn BucketStore>,
    key: String,
    rate: f64,
    capacity: f64,
}

impl TokenBucketLimiter {
    /// Create a limiter bound to `key`. `rate` is the refill rate in
    /// tokens/second and `capacity` the maximum pool size; both must be
    /// positive.
    pub fn new(
        store: Arc<dyn BucketStore>,
        key: impl Into<String>,
        rate: f64,
        capacity: f64,
    ) -> Result<Self> {
        super::check_params(rate, capacity)?;
        Ok(Self {
            store,
            key: key.into(),
            rate,
            capacity,
        })
    }

    /// The key this limiter is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Atomically evaluate one request. See [`Limiter::allow`].
    pub async fn allow(&self) -> Result<bool> {
        let now = unix_now_ms();
        let verdict = self
            .store
            .token_bucket(&self.key, self.rate, self.capacity, now)
            .await?;

        let admitted = verdict == VERDICT_ALLOWED;
        trace!(key = %self.key, admitted = admitted, "Token bucket evaluated");
        Ok(admitted)
    }
}

#[async_trait]
impl Limiter for TokenBucketLimiter {
    async fn allow(&self) -> Result<bool> {
        TokenBucketLimiter::allow(self).await
    }
}
