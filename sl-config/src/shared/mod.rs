//! Shared configuration types for semantic layer clients.

mod backoff;
mod base;
mod client;
mod timeout;

pub use backoff::BackoffConfig;
pub use base::ValidationError;
pub use client::{
    ClientConfig, ClientConfigWithoutSecrets, DEFAULT_COLUMNAR_URL_FORMAT,
    DEFAULT_GRAPHQL_URL_FORMAT, SERVER_HOST_PLACEHOLDER,
};
pub use timeout::TimeoutBudget;
