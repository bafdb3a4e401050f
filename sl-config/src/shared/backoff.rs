use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the wait intervals between job status polls.
///
/// The interval before poll `i` is `base_interval * growth_factor^i`, capped at
/// `max_interval`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Interval waited after the first poll.
    ///
    /// Specified in milliseconds for serialization compatibility.
    /// Default: 500ms
    #[serde(default = "default_base_interval_ms")]
    pub base_interval_ms: u64,

    /// Upper bound on a single interval.
    ///
    /// Default: 60000ms (60 seconds)
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    /// Multiplier applied to the interval after each poll.
    ///
    /// Must be >= 1.0.
    /// Default: 1.15
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
}

impl BackoffConfig {
    /// Default base interval: 500 milliseconds.
    pub const DEFAULT_BASE_INTERVAL_MS: u64 = 500;

    /// Default interval ceiling: 60 seconds.
    pub const DEFAULT_MAX_INTERVAL_MS: u64 = 60_000;

    /// Default growth factor.
    pub const DEFAULT_GROWTH_FACTOR: f64 = 1.15;

    /// Returns the base interval as a Duration.
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Returns the interval ceiling as a Duration.
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Validates the backoff configuration.
    ///
    /// Ensures the growth factor is finite and >= 1.0 and that the base interval does not
    /// exceed the ceiling.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "growth_factor".to_string(),
                constraint: "must be a finite number >= 1.0".to_string(),
            });
        }

        if self.base_interval_ms > self.max_interval_ms {
            return Err(ValidationError::InvalidFieldValue {
                field: "base_interval_ms".to_string(),
                constraint: "must be <= max_interval_ms".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: default_base_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            growth_factor: default_growth_factor(),
        }
    }
}

fn default_base_interval_ms() -> u64 {
    BackoffConfig::DEFAULT_BASE_INTERVAL_MS
}

fn default_max_interval_ms() -> u64 {
    BackoffConfig::DEFAULT_MAX_INTERVAL_MS
}

fn default_growth_factor() -> f64 {
    BackoffConfig::DEFAULT_GROWTH_FACTOR
}
