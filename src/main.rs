use std::sync::Arc;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use floodgate::config::{FloodgateConfig, Strategy};
use floodgate::limit::{LeakyBucketLimiter, Limiter, TokenBucketLimiter};
use floodgate::simulator::run_simulation;
use floodgate::store::{BucketStore, MemoryStore, RedisStore};

/// Distributed rate limiting over a shared Redis store.
#[derive(Parser, Debug)]
#[command(name = "floodgate", version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Bucket strategy to run
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Bucket key shared by all callers
    #[arg(long)]
    key: Option<String>,

    /// Leak/refill rate in units per second
    #[arg(long)]
    rate: Option<f64>,

    /// Maximum bucket content
    #[arg(long)]
    capacity: Option<f64>,

    /// Number of concurrent simulation workers
    #[arg(long)]
    workers: Option<usize>,

    /// Requests issued by each worker
    #[arg(long)]
    requests: Option<usize>,

    /// Redis connection URL
    #[arg(long)]
    redis_url: Option<String>,

    /// Use an in-process store instead of Redis
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    info!("Starting Floodgate");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    // Load configuration, then apply CLI overrides
    let mut config = match &args.config {
        Some(path) => FloodgateConfig::from_file(path)?,
        None => FloodgateConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.limiter.strategy = strategy;
    }
    if let Some(key) = args.key {
        config.limiter.key = key;
    }
    if let Some(rate) = args.rate {
        config.limiter.rate = rate;
    }
    if let Some(capacity) = args.capacity {
        config.limiter.capacity = capacity;
    }
    if let Some(workers) = args.workers {
        config.simulation.workers = workers;
    }
    if let Some(requests) = args.requests {
        config.simulation.requests_per_worker = requests;
    }
    if let Some(url) = args.redis_url {
        config.store.url = url;
    }

    let store: Arc<dyn BucketStore> = if args.memory {
        info!("Using in-process memory store");
        Arc::new(MemoryStore::new())
    } else {
        info!(url = %config.store.url, "Connecting to Redis store");
        Arc::new(RedisStore::connect(&config.store.url).await?)
    };

    let key = config.store.prefixed_key(&config.limiter.key);
    let limiter: Arc<dyn Limiter> = match config.limiter.strategy {
        Strategy::Leaky => Arc::new(LeakyBucketLimiter::new(
            store,
            key,
            config.limiter.rate,
            config.limiter.capacity,
        )?),
        Strategy::Token => Arc::new(TokenBucketLimiter::new(
            store,
            key,
            config.limiter.rate,
            config.limiter.capacity,
        )?),
    };

    info!(
        strategy = ?config.limiter.strategy,
        key = %config.limiter.key,
        rate = config.limiter.rate,
        capacity = config.limiter.capacity,
        "Limiter initialized"
    );

    let report = run_simulation(
        limiter,
        config.simulation.workers,
        config.simulation.requests_per_worker,
    )
    .await;

    info!(
        total = report.total(),
        admitted = report.admitted,
        denied = report.denied,
        errors = report.errors,
        "Floodgate finished"
    );

    Ok(())
}
