//! Clients of the semantic layer.
//!
//! [`MetadataClient`] speaks the GraphQL metadata protocol and runs queries as polled, paged jobs.
//! [`ColumnarClient`] runs queries through the columnar transport. [`SemanticLayerClient`] combines
//! both behind a [`RoutingTable`], and [`BlockingSemanticLayerClient`] drives it on the calling
//! thread.

mod columnar;
mod facade;
mod metadata;
mod routing;

pub use columnar::ColumnarClient;
pub use facade::{BlockingSemanticLayerClient, SemanticLayerClient};
pub use metadata::MetadataClient;
pub use routing::{Backend, Operation, RoutingTable};
