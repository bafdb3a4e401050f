//! Sessions the clients send requests through.
//!
//! A transport opens sessions and a session executes requests of one protocol. The clients never
//! build connections themselves, which keeps network internals out of the query algorithms and
//! lets tests swap in scripted transports.

mod http;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::SlResult;

pub use http::{BlockingHttpGraphQLTransport, HttpGraphQLSession, HttpGraphQLTransport};

/// Body of a GraphQL request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: Value,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

/// Opens sessions against the metadata (GraphQL) endpoint.
pub trait MetadataTransport: Send + Sync {
    type Session: MetadataSession;

    fn open(&self) -> impl Future<Output = SlResult<Self::Session>> + Send;
}

/// Marks metadata transports whose sessions make progress without an async reactor.
///
/// The blocking client polls its futures with [`futures::executor::block_on`], so transports
/// that need tokio timers or sockets, such as [`HttpGraphQLTransport`], must not implement it.
pub trait BlockingMetadataTransport: MetadataTransport {}

/// An open metadata session.
///
/// Sessions must support concurrent `execute` calls through a shared reference, which the
/// pager relies on to fetch pages in parallel.
pub trait MetadataSession: Send + Sync {
    /// Executes a request and returns the `data` member of the response.
    fn execute(&self, request: &GraphQLRequest) -> impl Future<Output = SlResult<Value>> + Send;

    fn close(self) -> impl Future<Output = SlResult<()>> + Send;
}

/// Status codes reported by the columnar transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnarStatusCode {
    Unauthenticated,
    Unauthorized,
    InvalidArgument,
    Timeout,
    Other,
}

/// Failure reported by a columnar session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("columnar transport error ({code:?}): {message}")]
pub struct ColumnarTransportError {
    pub code: ColumnarStatusCode,
    pub message: String,
}

impl ColumnarTransportError {
    pub fn new(code: ColumnarStatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Opens sessions against the columnar (Arrow Flight SQL) endpoint.
pub trait ColumnarTransport: Send + Sync {
    type Session: ColumnarSession;

    fn open(&self) -> impl Future<Output = Result<Self::Session, ColumnarTransportError>> + Send;
}

/// An open columnar session.
pub trait ColumnarSession: Send + Sync {
    /// Runs an embedded semantic layer statement and returns the raw Arrow IPC stream.
    fn execute_embedded_query(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ColumnarTransportError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), ColumnarTransportError>> + Send;
}
