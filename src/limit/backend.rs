//! Limiter trait for abstracting over the two bucket strategies.

use async_trait::async_trait;

use crate::error::Result;

/// Trait for rate limiter implementations.
///
/// This trait abstracts over [`LeakyBucketLimiter`](super::LeakyBucketLimiter)
/// and [`TokenBucketLimiter`](super::TokenBucketLimiter) so consumers can
/// work with either strategy.
#[async_trait]
pub trait Limiter: Send + Sync {
    /// Atomically evaluate one request against the shared bucket state.
    ///
    /// Returns `Ok(true)` when the request is admitted, `Ok(false)` when it
    /// is denied, and `Err` when the store could not be reached — in which
    /// case no admission decision was made and no state changed.
    async fn allow(&self) -> Result<bool>;
}

/// How a caller resolves a store error into a go/no-go decision.
///
/// The limiters themselves never apply this: a store failure always
/// surfaces as an `Err` so the caller can distinguish "denied" from
/// "unknown". This type makes the policy choice explicit for callers that
/// need a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request when the store is unreachable.
    FailOpen,
    /// Deny the request when the store is unreachable.
    FailClosed,
}

impl FailurePolicy {
    /// Collapse an admission outcome into a boolean decision.
    pub fn resolve(&self, outcome: Result<bool>) -> bool {
        match outcome {
            Ok(admitted) => admitted,
            Err(_) => matches!(self, FailurePolicy::FailOpen),
        }
    }
}
