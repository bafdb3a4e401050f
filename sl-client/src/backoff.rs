//! Wait intervals between job status polls.

use std::time::Duration;

use sl_config::shared::BackoffConfig;

/// Exponential backoff schedule.
///
/// The interval before poll `i` is `base_interval * growth_factor^i`, capped at `max_interval`.
/// The schedule holds no state, so [`ExponentialBackoff::iter`] always restarts at `i = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base_interval: Duration,
    max_interval: Duration,
    growth_factor: f64,
}

impl ExponentialBackoff {
    /// Creates a schedule.
    ///
    /// Growth factors below `1.0` (or NaN) are raised to `1.0` so intervals never shrink.
    pub fn new(base_interval: Duration, max_interval: Duration, growth_factor: f64) -> Self {
        Self {
            base_interval: base_interval.min(max_interval),
            max_interval,
            growth_factor: growth_factor.max(1.0),
        }
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// Returns the interval waited after poll `attempt`.
    pub fn interval(&self, attempt: u32) -> Duration {
        // Zero times an overflowed growth term is NaN, not zero.
        if self.base_interval.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let multiplier = self.growth_factor.powi(exponent);
        let delay_ms = self.base_interval.as_millis() as f64 * multiplier;

        let capped_delay_ms = delay_ms.min(self.max_interval.as_millis() as f64);

        Duration::from_millis(capped_delay_ms.round() as u64)
    }

    /// Returns the infinite sequence of intervals, starting from the first one.
    pub fn iter(&self) -> BackoffIter {
        BackoffIter {
            backoff: *self,
            attempt: 0,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for ExponentialBackoff {
    fn from(config: &BackoffConfig) -> Self {
        Self::new(
            config.base_interval(),
            config.max_interval(),
            config.growth_factor,
        )
    }
}

/// Iterator over the intervals of an [`ExponentialBackoff`]. Never ends.
#[derive(Debug, Clone)]
pub struct BackoffIter {
    backoff: ExponentialBackoff,
    attempt: u32,
}

impl Iterator for BackoffIter {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let interval = self.backoff.interval(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        Some(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let backoff = ExponentialBackoff::default();

        assert_eq!(backoff.interval(0), Duration::from_millis(500));
        assert_eq!(backoff.interval(1), Duration::from_millis(575));
        assert_eq!(backoff.interval(100), Duration::from_secs(60));
        assert_eq!(backoff.interval(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_intervals_are_capped_and_non_decreasing() {
        let backoff = ExponentialBackoff::default();

        let intervals: Vec<_> = backoff.iter().take(200).collect();
        for window in intervals.windows(2) {
            assert!(window[0] <= window[1]);
        }
        assert!(intervals.iter().all(|i| *i <= backoff.max_interval()));
    }

    #[test]
    fn test_iter_restarts() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_secs(1), 2.0);

        let first: Vec<_> = backoff.iter().take(3).collect();
        let second: Vec<_> = backoff.iter().take(3).collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40)
            ]
        );
    }

    #[test]
    fn test_zero_base_stays_zero() {
        let backoff = ExponentialBackoff::new(Duration::ZERO, Duration::from_secs(60), 1.15);

        assert_eq!(backoff.interval(0), Duration::ZERO);
        assert_eq!(backoff.interval(6000), Duration::ZERO);
        assert_eq!(backoff.interval(u32::MAX), Duration::ZERO);
    }

    #[test]
    fn test_shrinking_growth_is_raised() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(1), 0.5);

        assert_eq!(backoff.interval(5), Duration::from_millis(100));
    }

    #[test]
    fn test_from_config() {
        let config = BackoffConfig {
            base_interval_ms: 100,
            max_interval_ms: 250,
            growth_factor: 2.0,
        };

        let backoff = ExponentialBackoff::from(&config);

        assert_eq!(backoff.interval(1), Duration::from_millis(200));
        assert_eq!(backoff.interval(2), Duration::from_millis(250));
    }
}
