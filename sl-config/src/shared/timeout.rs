use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Wall-clock budgets for operations against the semantic layer.
///
/// `total` bounds everything, including connecting, executing, polling and closing. No
/// sub-budget may exceed it: larger values are clamped to `total` at construction, including
/// when the budget is deserialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TimeoutBudgetMs", into = "TimeoutBudgetMs")]
pub struct TimeoutBudget {
    total: Duration,
    connect: Duration,
    execute: Duration,
    tls_close: Duration,
}

impl TimeoutBudget {
    /// Default total budget: 90 seconds.
    pub const DEFAULT_TOTAL: Duration = Duration::from_secs(90);

    /// Default connect budget: 10 seconds.
    pub const DEFAULT_CONNECT: Duration = Duration::from_secs(10);

    /// Default execute budget: 90 seconds.
    pub const DEFAULT_EXECUTE: Duration = Duration::from_secs(90);

    /// Default TLS close budget: 10 seconds.
    pub const DEFAULT_TLS_CLOSE: Duration = Duration::from_secs(10);

    /// Creates a budget, clamping every sub-budget to `total`.
    pub fn new(total: Duration, connect: Duration, execute: Duration, tls_close: Duration) -> Self {
        Self {
            total,
            connect: connect.min(total),
            execute: execute.min(total),
            tls_close: tls_close.min(total),
        }
    }

    /// Creates a budget where every sub-budget equals `total`.
    pub fn from_total(total: Duration) -> Self {
        Self::new(total, total, total, total)
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn connect(&self) -> Duration {
        self.connect
    }

    pub fn execute(&self) -> Duration {
        self.execute
    }

    pub fn tls_close(&self) -> Duration {
        self.tls_close
    }
}

impl Default for TimeoutBudget {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_TOTAL,
            Self::DEFAULT_CONNECT,
            Self::DEFAULT_EXECUTE,
            Self::DEFAULT_TLS_CLOSE,
        )
    }
}

impl From<Duration> for TimeoutBudget {
    fn from(total: Duration) -> Self {
        Self::from_total(total)
    }
}

/// Serialized form of [`TimeoutBudget`], in milliseconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct TimeoutBudgetMs {
    #[serde(default = "default_total_ms")]
    total_ms: u64,
    #[serde(default = "default_connect_ms")]
    connect_ms: u64,
    #[serde(default = "default_execute_ms")]
    execute_ms: u64,
    #[serde(default = "default_tls_close_ms")]
    tls_close_ms: u64,
}

impl From<TimeoutBudgetMs> for TimeoutBudget {
    fn from(raw: TimeoutBudgetMs) -> Self {
        TimeoutBudget::new(
            Duration::from_millis(raw.total_ms),
            Duration::from_millis(raw.connect_ms),
            Duration::from_millis(raw.execute_ms),
            Duration::from_millis(raw.tls_close_ms),
        )
    }
}

impl From<TimeoutBudget> for TimeoutBudgetMs {
    fn from(budget: TimeoutBudget) -> Self {
        TimeoutBudgetMs {
            total_ms: budget.total.as_millis() as u64,
            connect_ms: budget.connect.as_millis() as u64,
            execute_ms: budget.execute.as_millis() as u64,
            tls_close_ms: budget.tls_close.as_millis() as u64,
        }
    }
}

fn default_total_ms() -> u64 {
    TimeoutBudget::DEFAULT_TOTAL.as_millis() as u64
}

fn default_connect_ms() -> u64 {
    TimeoutBudget::DEFAULT_CONNECT.as_millis() as u64
}

fn default_execute_ms() -> u64 {
    TimeoutBudget::DEFAULT_EXECUTE.as_millis() as u64
}

fn default_tls_close_ms() -> u64 {
    TimeoutBudget::DEFAULT_TLS_CLOSE.as_millis() as u64
}
