//! Configuration management for Floodgate.

use serde::{Deserialize, Serialize};

/// Limiting strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Leaky bucket: smooths bursts, bounds sustained throughput.
    Leaky,
    /// Token bucket: permits bursts up to the full capacity.
    Token,
}

/// Main configuration for Floodgate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Shared store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Limiter configuration
    #[serde(default)]
    pub limiter: LimiterSettings,

    /// Simulation configuration
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Default for FloodgateConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            limiter: LimiterSettings::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Shared store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Optional prefix prepended to every bucket key, separated by a colon
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: None,
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

impl StoreConfig {
    /// Apply the configured prefix to a bucket key.
    pub fn prefixed_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

/// Limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Which bucket strategy to use
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,

    /// Bucket key shared by all limiter instances
    #[serde(default = "default_key")]
    pub key: String,

    /// Leak/refill rate in units per second
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// Maximum bucket content
    #[serde(default = "default_capacity")]
    pub capacity: f64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            key: default_key(),
            rate: default_rate(),
            capacity: default_capacity(),
        }
    }
}

fn default_strategy() -> Strategy {
    Strategy::Token
}

fn default_key() -> String {
    "floodgate".to_string()
}

fn default_rate() -> f64 {
    10.0
}

fn default_capacity() -> f64 {
    100.0
}

/// Simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Requests issued by each worker
    #[serde(default = "default_requests_per_worker")]
    pub requests_per_worker: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            requests_per_worker: default_requests_per_worker(),
        }
    }
}

fn default_workers() -> usize {
    100
}

fn default_requests_per_worker() -> usize {
    1
}

impl FloodgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FloodgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::FloodgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
