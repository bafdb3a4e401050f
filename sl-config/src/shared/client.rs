use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::load::Config;
use crate::shared::{BackoffConfig, TimeoutBudget, ValidationError};

/// Placeholder substituted with [`ClientConfig::host`] in URL formats.
pub const SERVER_HOST_PLACEHOLDER: &str = "{server_host}";

/// Default URL format of the metadata (GraphQL) endpoint.
pub const DEFAULT_GRAPHQL_URL_FORMAT: &str = "https://{server_host}/api/graphql";

/// Default URL format of the columnar (Arrow Flight SQL) endpoint.
pub const DEFAULT_COLUMNAR_URL_FORMAT: &str = "grpc+tls://{server_host}:443";

fn default_graphql_url_format() -> String {
    DEFAULT_GRAPHQL_URL_FORMAT.to_string()
}

fn default_columnar_url_format() -> String {
    DEFAULT_COLUMNAR_URL_FORMAT.to_string()
}

/// Connection settings for a semantic layer client.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking the auth token into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Host serving the semantic layer APIs, without scheme.
    pub host: String,
    /// Identifier of the environment every request is scoped to.
    pub environment_id: u64,
    /// Service token sent as a bearer token.
    pub auth_token: SecretString,
    /// Format of the metadata endpoint URL. Must contain `{server_host}`.
    #[serde(default = "default_graphql_url_format")]
    pub graphql_url_format: String,
    /// Format of the columnar endpoint URL. Must contain `{server_host}`.
    #[serde(default = "default_columnar_url_format")]
    pub columnar_url_format: String,
    /// Whether nested metadata objects are fetched on demand instead of up front.
    #[serde(default)]
    pub lazy_metadata: bool,
    #[serde(default)]
    pub timeout: TimeoutBudget,
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl ClientConfig {
    /// Creates a configuration with default URL formats, budgets and backoff.
    pub fn new(host: impl Into<String>, environment_id: u64, auth_token: SecretString) -> Self {
        Self {
            host: host.into(),
            environment_id,
            auth_token,
            graphql_url_format: default_graphql_url_format(),
            columnar_url_format: default_columnar_url_format(),
            lazy_metadata: false,
            timeout: TimeoutBudget::default(),
            backoff: BackoffConfig::default(),
        }
    }

    /// Returns the metadata endpoint URL for the configured host.
    pub fn graphql_url(&self) -> String {
        self.graphql_url_format.replace(SERVER_HOST_PLACEHOLDER, &self.host)
    }

    /// Returns the columnar endpoint URL for the configured host.
    pub fn columnar_url(&self) -> String {
        self.columnar_url_format.replace(SERVER_HOST_PLACEHOLDER, &self.host)
    }

    /// Validates the client configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }

        for (field, format) in [
            ("graphql_url_format", &self.graphql_url_format),
            ("columnar_url_format", &self.columnar_url_format),
        ] {
            if !format.contains(SERVER_HOST_PLACEHOLDER) {
                return Err(ValidationError::MissingHostPlaceholder {
                    field: field.to_string(),
                });
            }
        }

        self.backoff.validate()
    }
}

impl Config for ClientConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ClientConfig::validate(self)
    }
}

/// Same as [`ClientConfig`] but without the auth token, safe to log or serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfigWithoutSecrets {
    pub host: String,
    pub environment_id: u64,
    pub graphql_url_format: String,
    pub columnar_url_format: String,
    pub lazy_metadata: bool,
    pub timeout: TimeoutBudget,
    pub backoff: BackoffConfig,
}

impl From<ClientConfig> for ClientConfigWithoutSecrets {
    fn from(value: ClientConfig) -> Self {
        ClientConfigWithoutSecrets {
            host: value.host,
            environment_id: value.environment_id,
            graphql_url_format: value.graphql_url_format,
            columnar_url_format: value.columnar_url_format,
            lazy_metadata: value.lazy_metadata,
            timeout: value.timeout,
            backoff: value.backoff,
        }
    }
}
