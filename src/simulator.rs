//! Concurrent caller simulation.
//!
//! Drives many independent workers against one shared limiter to exercise
//! the atomic-evaluation contract under contention. Useful for demonstrating
//! a deployment's effective admission rate and for load-testing a store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::limit::Limiter;

/// Tally of a completed simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Requests the limiter admitted.
    pub admitted: u64,
    /// Requests the limiter denied.
    pub denied: u64,
    /// Calls that failed with a store error; no decision was made for these.
    pub errors: u64,
}

impl SimulationReport {
    /// Total calls issued.
    pub fn total(&self) -> u64 {
        self.admitted + self.denied + self.errors
    }
}

/// Run `workers` concurrent tasks, each issuing `requests_per_worker` calls
/// to the shared limiter, and tally the outcomes.
///
/// Workers race freely with no coordination between them; any serialization
/// of their calls happens inside the store, exactly as it would across
/// separate processes or hosts.
pub async fn run_simulation(
    limiter: Arc<dyn Limiter>,
    workers: usize,
    requests_per_worker: usize,
) -> SimulationReport {
    let admitted = Arc::new(AtomicU64::new(0));
    let denied = Arc::new(AtomicU64::new(0));
    let errors = Arc::new(AtomicU64::new(0));

    info!(
        workers = workers,
        requests_per_worker = requests_per_worker,
        "Starting simulation"
    );

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let limiter = limiter.clone();
        let admitted = admitted.clone();
        let denied = denied.clone();
        let errors = errors.clone();

        handles.push(tokio::spawn(async move {
            for request in 0..requests_per_worker {
                match limiter.allow().await {
                    Ok(true) => {
                        admitted.fetch_add(1, Ordering::Relaxed);
                        debug!(worker = worker, request = request, "Request admitted");
                    }
                    Ok(false) => {
                        denied.fetch_add(1, Ordering::Relaxed);
                        debug!(worker = worker, request = request, "Request denied");
                    }
                    Err(e) => {
                        errors.fetch_add(1, Ordering::Relaxed);
                        warn!(worker = worker, request = request, error = %e, "Store call failed");
                    }
                }
            }
        }));
    }

    futures::future::join_all(handles).await;

    let report = SimulationReport {
        admitted: admitted.load(Ordering::Relaxed),
        denied: denied.load(Ordering::Relaxed),
        errors: errors.load(Ordering::Relaxed),
    };

    info!(
        admitted = report.admitted,
        denied = report.denied,
        errors = report.errors,
        "Simulation complete"
    );

    report
}
