//! Bucket state storage and atomic evaluation.
//!
//! Both limiting strategies delegate their entire read-compute-write cycle
//! to the store, which must execute it indivisibly per key with respect to
//! any concurrent caller. The store is the sole synchronization point: no
//! bucket state is ever cached in process.

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;

use crate::error::Result;

/// Verdict returned by a state-transition procedure: request admitted.
pub const VERDICT_ALLOWED: i64 = 1;
/// Verdict returned by a state-transition procedure: request denied.
pub const VERDICT_DENIED: i64 = 0;

/// Idle window after which a bucket's stored state expires and the bucket
/// logically resets to its initial empty/full state.
pub const IDLE_TTL_MS: i64 = 60_000;

/// A shared store capable of executing a bucket state transition atomically
/// against a single key.
///
/// Each method performs one complete fetch-compute-write cycle for the named
/// key and returns [`VERDICT_ALLOWED`] or [`VERDICT_DENIED`]. Implementations
/// must guarantee that two concurrent calls on the same key are linearized
/// into some total order, never interleaved at the sub-operation level.
/// Timestamps are milliseconds since the Unix epoch and must be produced
/// consistently for a given key.
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Evaluate the leaky-bucket transition for `key`.
    ///
    /// Water leaks at `rate` units/second since the stored `last` timestamp;
    /// admission adds one unit. A denied request writes nothing, so neither
    /// the leaked credit nor a new `last` timestamp is persisted.
    async fn leaky_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64>;

    /// Evaluate the token-bucket transition for `key`.
    ///
    /// Tokens regenerate at `rate` per second up to `capacity`; admission
    /// consumes one. The refilled count and a `last` of `now_ms` are written
    /// on every call, admitted or not.
    async fn token_bucket(&self, key: &str, rate: f64, capacity: f64, now_ms: i64) -> Result<i64>;
}
