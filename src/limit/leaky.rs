//! Leaky-bucket rate limiter.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::Result;
use crate::store::{BucketStore, VERDICT_ALLOWED};

use super::backend::Limiter;
use super::unix_now_ms;

/// A rate limiter that bounds sustained throughput to `rate` units/second.
///
/// Each admitted request adds one unit of water to a bucket that drains
/// continuously at `rate`; a request is denied when admitting it would
/// overflow `capacity`. Bursts are smoothed rather than absorbed: a full
/// bucket admits nothing until enough time has passed for water to leak out.
///
/// Instances sharing a key and strategy are interchangeable — all state
/// lives in the store, so any number of limiters across any number of
/// processes observe and mutate the same logical bucket.
pub struct LeakyBucketLimiter {
    store: Arc<dyn BucketStore>,
    key: String,
    rate: f64,
    capacity: f64,
}

impl LeakyBucketLimiter {
    /// Create a limiter bound to `key`. `rate` is the leak rate in
    /// units/second and `capacity` the maximum bucket content; both must be
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
            .leaky_bucket(&self.key, self.rate, self.capacity, now)
            .await?;

        let admitted = verdict == VERDICT_ALLOWED;
        trace!(key = %self.key, admitted = admitted, "Leaky bucket evaluated");
        Ok(admitted)
    }
}

#[async_trait]
impl Limiter for LeakyBucketLimiter {
    async fn allow(&self) -> Result<bool> {
        LeakyBucketLimiter::allow(self).await
    }
}
