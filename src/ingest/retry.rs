//! Retry settings for event dispatch.
//!
//! Uses `backon` for the backoff schedule. Whatever the configuration says, no
//! retry waits less than [`MIN_BACKOFF`].

use backon::{ConstantBuilder, ExponentialBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest wait between two attempts at the same message.
pub const MIN_BACKOFF: Duration = Duration::from_secs(2);

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Every retry waits the base delay.
    #[default]
    Fixed,
    /// The delay doubles per retry, capped at the max delay.
    Exponential,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never less than 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: MIN_BACKOFF,
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Retries after the first attempt.
    pub fn retries(&self) -> usize {
        self.max_attempts.max(1) as usize - 1
    }

    /// First delay, raised to [`MIN_BACKOFF`].
    pub fn min_delay(&self) -> Duration {
        self.base_delay.max(MIN_BACKOFF)
    }

    /// Delay cap, never below [`Self::min_delay`].
    pub fn max_delay(&self) -> Duration {
        self.max_delay.max(self.min_delay())
    }

    /// Backoff for [`BackoffStrategy::Fixed`].
    pub fn constant(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.min_delay())
            .with_max_times(self.retries())
    }

    /// Backoff for [`BackoffStrategy::Exponential`].
    pub fn exponential(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay())
            .with_max_delay(self.max_delay())
            .with_max_times(self.retries())
    }
}
