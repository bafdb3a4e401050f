use secrecy::SecretString;
use sl_config::shared::{BackoffConfig, ClientConfig, TimeoutBudget};

/// Returns a client configuration for a fake host with short poll intervals.
pub fn test_client_config() -> ClientConfig {
    ClientConfig {
        timeout: TimeoutBudget::default(),
        backoff: BackoffConfig {
            base_interval_ms: 10,
            max_interval_ms: 100,
            growth_factor: 2.0,
        },
        ..ClientConfig::new(
            "semantic-layer.test",
            123,
            SecretString::new("test-token".to_string()),
        )
    }
}
