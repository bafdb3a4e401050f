//! Execution modes shared by the poll and pagination algorithms.
//!
//! The algorithms are written once as `async` code against [`Runtime`]. The non-blocking client
//! drives them on tokio. The blocking client drives them with [`futures::executor::block_on`]
//! and a runtime whose sleeps block the calling thread.

use std::future::Future;
use std::time::{Duration, Instant};

/// How transport calls of one client are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Every call blocks the calling thread; page fetches run one after another.
    Blocking,
    /// Calls are suspension points; page fetches overlap.
    NonBlocking,
}

/// Clock and sleep capability of an execution mode.
pub trait Runtime: Send + Sync {
    fn mode(&self) -> ExecutionMode;

    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Cooperative runtime backed by tokio timers.
///
/// Reads the clock through tokio so paused test time is honored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::NonBlocking
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Runtime that blocks the calling thread while sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingRuntime;

impl Runtime for BlockingRuntime {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Blocking
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        async move { std::thread::sleep(duration) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_runtime_uses_paused_clock() {
        let runtime = TokioRuntime;
        let start = runtime.now();

        runtime.sleep(Duration::from_secs(30)).await;

        assert!(runtime.now().duration_since(start) >= Duration::from_secs(30));
    }

    #[test]
    fn test_blocking_runtime_sleeps() {
        let runtime = BlockingRuntime;
        let start = runtime.now();

        futures::executor::block_on(runtime.sleep(Duration::from_millis(5)));

        assert!(runtime.now().duration_since(start) >= Duration::from_millis(5));
        assert_eq!(runtime.mode(), ExecutionMode::Blocking);
    }
}
