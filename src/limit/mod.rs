//! Rate limiting strategies.

mod backend;
mod leaky;
mod token;

pub use backend::{FailurePolicy, Limiter};
pub use leaky::LeakyBucketLimiter;
pub use token::TokenBucketLimiter;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All limiters produce timestamps through this one function so that every
/// value written to a key uses the same unit and origin.
pub(crate) fn unix_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Validate limiter construction parameters.
pub(crate) fn check_params(rate: f64, capacity: f64) -> crate::error::Result<()> {
    if !(rate > 0.0 && rate.is_finite()) {
        return Err(crate::error::FloodgateError::Limit(format!(
            "rate must be a positive number, got {}",
            rate
        )));
    }
    if !(capacity > 0.0 && capacity.is_finite()) {
        return Err(crate::error::FloodgateError::Limit(format!(
            "capacity must be a positive number, got {}",
            capacity
        )));
    }
    Ok(())
}
