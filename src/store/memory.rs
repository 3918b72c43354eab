//! In-process bucket store.
//!
//! Implements the same state transitions as the Redis Lua scripts, useful
//! for tests and single-process simulation runs. A single mutex around the
//! bucket map provides the per-key indivisibility the [`BucketStore`]
//! contract requires; expiry is enforced lazily by comparing the stored
//! deadline against the caller-supplied timestamp.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

use super::{BucketStore, IDLE_TTL_MS, VERDICT_ALLOWED, VERDICT_DENIED};

/// Stored state for one bucket. `level` is water for the leaky bucket and
/// remaining tokens for the token bucket; a key is only ever driven by one
/// strategy.
#[derive(Debug, Clone, Copy)]
struct BucketRecord {
    level: f64,
    last: i64,
    expires_at: i64,
}

/// A [`BucketStore`] holding all bucket state in process memory.
#[derive(Default)]
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, BucketRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the live `(level, last)` record for a key, if present and not
    /// expired as of `now_ms`. Primarily useful for tests.
    pub fn get_bucket(&self, key: &str, now_ms: i64) -> Option<(f64, i64)> {
        let buckets = self.buckets.lock();
        buckets
            .get(key)
            .filter(|r| r.expires_at > now_ms)
            .map(|r| (r.level, r.last))
    }

    /// Number of keys with stored state, expired or not.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn leaky_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64> {
        let mut buckets = self.buckets.lock();

        let (water, last) = match buckets.get(key).filter(|r| r.expires_at > now_ms) {
            Some(r) => (r.level, r.last),
            None => (0.0, now_ms),
        };

        let elapsed = (now_ms - last).max(0);
        let leaked = elapsed as f64 / 1000.0 * rate;
        let water = (water - leaked).max(0.0);

        if water + 1.0 > capacity {
            // No write: leaked credit is not banked and `last` stays put.
            return Ok(VERDICT_DENIED);
        }

        buckets.insert(
            key.to_string(),
            BucketRecord {
                level: water + 1.0,
                last: now_ms,
                expires_at: now_ms + IDLE_TTL_MS,
            },
        );
        Ok(VERDICT_ALLOWED)
    }

    async fn token_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64> {
        let mut buckets = self.buckets.lock();

        let (tokens, last) = match buckets.get(key).filter(|r| r.expires_at > now_ms) {
            Some(r) => (r.level, r.last),
            None => (capacity, now_ms),
        };

        let elapsed = (now_ms - last).max(0);
        let generated = elapsed as f64 / 1000.0 * rate;
        let mut tokens = (tokens + generated).min(capacity);

        let verdict = if tokens >= 1.0 {
            tokens -= 1.0;
            VERDICT_ALLOWED
        } else {
            VERDICT_DENIED
        };

        // Written on both branches, so `last` always advances.
        buckets.insert(
            key.to_string(),
            BucketRecord {
                level: tokens,
                last: now_ms,
                expires_at: now_ms + IDLE_TTL_MS,
            },
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[tokio::test]
    async fn test_leaky_cold_start_admits() {
        let store = MemoryStore::new();
        let verdict = store.leaky_bucket("k", 1.0, 1.0, T0).await.unwrap();
        assert_eq!(verdict, VERDICT_ALLOWED);
        assert_eq!(store.get_bucket("k", T0), Some((1.0, T0)));
    }

    #[tokio::test]
    async fn test_leaky_worked_example() {
        // rate=1, capacity=1: admit at t=0, deny at t=0, admit at t=1000ms.
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("k", 1.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.leaky_bucket("k", 1.0, 1.0, T0).await.unwrap(), VERDICT_DENIED);
        assert_eq!(
            store.leaky_bucket("k", 1.0, 1.0, T0 + 1000).await.unwrap(),
            VERDICT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_leaky_burst_bounded_by_capacity() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            assert_eq!(store.leaky_bucket("k", 1.0, 5.0, T0).await.unwrap(), VERDICT_ALLOWED);
        }
        assert_eq!(store.leaky_bucket("k", 1.0, 5.0, T0).await.unwrap(), VERDICT_DENIED);
    }

    #[tokio::test]
    async fn test_leaky_rejection_does_not_persist_leak() {
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("k", 1.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);

        // 500ms leaks half a unit, not enough for the next request. The
        // rejection must leave the record exactly as the admission wrote it.
        assert_eq!(
            store.leaky_bucket("k", 1.0, 1.0, T0 + 500).await.unwrap(),
            VERDICT_DENIED
        );
        assert_eq!(store.get_bucket("k", T0 + 500), Some((1.0, T0)));
    }

    #[tokio::test]
    async fn test_leaky_recovery_after_one_over_rate() {
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("k", 2.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.leaky_bucket("k", 2.0, 1.0, T0).await.unwrap(), VERDICT_DENIED);

        // 1/rate = 500ms leaks exactly one unit.
        assert_eq!(
            store.leaky_bucket("k", 2.0, 1.0, T0 + 500).await.unwrap(),
            VERDICT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_leaky_future_last_never_grows_water() {
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("k", 1.0, 2.0, T0).await.unwrap(), VERDICT_ALLOWED);

        // A caller whose clock lags the writer's sees a negative interval;
        // the elapsed clamp means no leak, but also no extra fill.
        assert_eq!(
            store.leaky_bucket("k", 1.0, 2.0, T0 - 5000).await.unwrap(),
            VERDICT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_token_cold_start_is_full() {
        let store = MemoryStore::new();
        assert_eq!(store.token_bucket("k", 1.0, 3.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.get_bucket("k", T0), Some((2.0, T0)));
    }

    #[tokio::test]
    async fn test_token_burst_bound() {
        // floor(capacity) consecutive admissions with zero elapsed time,
        // then denial.
        let store = MemoryStore::new();
        for _ in 0..3 {
            assert_eq!(store.token_bucket("k", 1.0, 3.5, T0).await.unwrap(), VERDICT_ALLOWED);
        }
        assert_eq!(store.token_bucket("k", 1.0, 3.5, T0).await.unwrap(), VERDICT_DENIED);
    }

    #[tokio::test]
    async fn test_token_denial_advances_last_and_writes_refill() {
        let store = MemoryStore::new();
        assert_eq!(store.token_bucket("k", 1.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);

        // Denied at +400ms: 0.4 tokens regenerated, record still written
        // with last = now.
        assert_eq!(store.token_bucket("k", 1.0, 1.0, T0 + 400).await.unwrap(), VERDICT_DENIED);
        let (tokens, last) = store.get_bucket("k", T0 + 400).unwrap();
        assert!((tokens - 0.4).abs() < 1e-9);
        assert_eq!(last, T0 + 400);
    }

    #[tokio::test]
    async fn test_token_recovery_after_one_over_rate() {
        let store = MemoryStore::new();
        assert_eq!(store.token_bucket("k", 4.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.token_bucket("k", 4.0, 1.0, T0).await.unwrap(), VERDICT_DENIED);

        // 1/rate = 250ms regenerates one token.
        assert_eq!(
            store.token_bucket("k", 4.0, 1.0, T0 + 250).await.unwrap(),
            VERDICT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_token_refill_clamped_at_capacity() {
        let store = MemoryStore::new();
        assert_eq!(store.token_bucket("k", 10.0, 2.0, T0).await.unwrap(), VERDICT_ALLOWED);

        // An hour of idle time within the TTL window would generate far
        // more than capacity; the clamp holds.
        let later = T0 + 59_000;
        assert_eq!(store.token_bucket("k", 10.0, 2.0, later).await.unwrap(), VERDICT_ALLOWED);
        let (tokens, _) = store.get_bucket("k", later).unwrap();
        assert!((tokens - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_token_never_negative() {
        let store = MemoryStore::new();
        for _ in 0..10 {
            store.token_bucket("k", 0.001, 1.0, T0).await.unwrap();
        }
        let (tokens, _) = store.get_bucket("k", T0).unwrap();
        assert!(tokens >= 0.0);
    }

    #[tokio::test]
    async fn test_expiration_resets_to_cold_start() {
        let store = MemoryStore::new();

        // Drain the token bucket completely.
        assert_eq!(store.token_bucket("k", 0.001, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.token_bucket("k", 0.001, 1.0, T0).await.unwrap(), VERDICT_DENIED);

        // Past the 60s idle window the record is treated as absent and the
        // bucket starts full again.
        let later = T0 + IDLE_TTL_MS + 1;
        assert_eq!(store.get_bucket("k", later), None);
        assert_eq!(store.token_bucket("k", 0.001, 1.0, later).await.unwrap(), VERDICT_ALLOWED);
    }

    #[tokio::test]
    async fn test_leaky_expiration_resets_to_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("k", 0.001, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.leaky_bucket("k", 0.001, 1.0, T0).await.unwrap(), VERDICT_DENIED);

        let later = T0 + IDLE_TTL_MS + 1;
        assert_eq!(store.leaky_bucket("k", 0.001, 1.0, later).await.unwrap(), VERDICT_ALLOWED);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryStore::new();
        assert_eq!(store.leaky_bucket("a", 1.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.leaky_bucket("b", 1.0, 1.0, T0).await.unwrap(), VERDICT_ALLOWED);
        assert_eq!(store.bucket_count(), 2);
    }
}
