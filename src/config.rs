//! Configuration for the loyalty tier service.
//!
//! Supports a YAML file and environment variable overrides.

use crate::ingest::{BackoffStrategy, RetryPolicy, MIN_BACKOFF};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub scanner: ScannerConfig,
    pub store: StoreConfig,
}

/// Event consumption.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Named channel the ordering system publishes to.
    pub channel: String,
    pub consumer_group: String,
    /// Number of per-customer lanes processed concurrently.
    pub partitions: usize,
    pub lane_capacity: usize,
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
    /// Raised to 2000 if lower.
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            channel: "customer.events".to_string(),
            consumer_group: "customer-service-group".to_string(),
            partitions: 4,
            lane_capacity: 64,
            max_attempts: 3,
            backoff: BackoffStrategy::Fixed,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
        }
    }
}

impl IngestConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let base_delay = Duration::from_millis(self.base_delay_ms);
        if base_delay < MIN_BACKOFF {
            warn!(
                base_delay_ms = self.base_delay_ms,
                floor_ms = MIN_BACKOFF.as_millis() as u64,
                "Retry delay below floor, raising it"
            );
        }
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay,
            max_delay: Duration::from_millis(self.max_delay_ms),
            strategy: self.backoff,
        }
    }
}

/// Milestone scan schedule.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScannerConfig {
    pub interval_secs: u64,
    pub page_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            page_size: 100,
        }
    }
}

impl ScannerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// In-memory customer store.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Request queue size of the store actor.
    pub buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { buffer_size: 32 }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (`TIER_CONFIG`, default `tier.yaml`)
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("TIER_CONFIG").unwrap_or_else(|_| "tier.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from `lookup`; unparsable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(channel) = lookup("INGEST_CHANNEL") {
            self.ingest.channel = channel;
        }
        if let Some(group) = lookup("INGEST_CONSUMER_GROUP") {
            self.ingest.consumer_group = group;
        }
        if let Some(p) = lookup("INGEST_PARTITIONS").and_then(|v| v.parse().ok()) {
            self.ingest.partitions = p;
        }
        if let Some(n) = lookup("INGEST_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.ingest.max_attempts = n;
        }
        if let Some(ms) = lookup("INGEST_BACKOFF_MS").and_then(|v| v.parse().ok()) {
            self.ingest.base_delay_ms = ms;
        }
        if let Some(secs) = lookup("SCAN_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.scanner.interval_secs = secs;
        }
        if let Some(size) = lookup("SCAN_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.scanner.page_size = size;
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
