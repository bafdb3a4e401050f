use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used by [`init_test_tracing`] when `RUST_LOG` is not set.
const TEST_DEFAULT_DIRECTIVE: &str = "sl_client=debug";

static TEST_TRACING: Once = Once::new();

/// Installs the global tracing subscriber.
///
/// Log levels come from the `RUST_LOG` environment variable, falling back to
/// `default_directive` (for example `"sl_client=info"`) when it is unset or invalid.
/// Fails if a global subscriber was already installed.
///
/// ```
/// sl_telemetry::tracing::init_tracing("sl_client=info").unwrap();
///
/// tracing::info!("semantic layer client starting");
/// ```
pub fn init_tracing(default_directive: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(default_directive))
        .with(fmt::layer())
        .try_init()
}

/// Installs a subscriber that writes through the test harness capture.
///
/// Safe to call from every test: only the first call in the process has an effect.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::registry()
            .with(build_filter(TEST_DEFAULT_DIRECTIVE))
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
