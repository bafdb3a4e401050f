//! Client-side query engine for a remote semantic layer.
//!
//! Queries are validated locally, sent either through the GraphQL metadata protocol (where they
//! run as jobs that are polled and paged) or through the columnar transport, and returned as
//! Arrow record batches.

mod macros;

pub mod backoff;
pub mod client;
pub mod error;
pub mod models;
pub mod pager;
pub mod params;
pub mod poller;
pub mod protocol;
pub mod runtime;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transport;

pub use sl_config::shared::ClientConfig;
