use std::sync::Arc;

use tokio::sync::Mutex;

use crate::transport::{ColumnarSession, ColumnarTransport, ColumnarTransportError};

#[derive(Debug, Default)]
struct Inner {
    queries: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Columnar transport answering every statement with the same scripted response.
#[derive(Debug, Clone)]
pub struct MockColumnarTransport {
    response: Result<Vec<u8>, ColumnarTransportError>,
    inner: Arc<Mutex<Inner>>,
}

impl MockColumnarTransport {
    /// Answers every statement with the given Arrow IPC stream.
    pub fn new(ipc_stream: Vec<u8>) -> Self {
        Self {
            response: Ok(ipc_stream),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Fails every statement with `error`.
    pub fn failing(error: ColumnarTransportError) -> Self {
        Self {
            response: Err(error),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Returns every statement executed so far, in order.
    pub async fn queries(&self) -> Vec<String> {
        self.inner.lock().await.queries.clone()
    }

    pub async fn opened(&self) -> usize {
        self.inner.lock().await.opened
    }

    pub async fn closed(&self) -> usize {
        self.inner.lock().await.closed
    }
}

impl ColumnarTransport for MockColumnarTransport {
    type Session = MockColumnarSession;

    async fn open(&self) -> Result<MockColumnarSession, ColumnarTransportError> {
        self.inner.lock().await.opened += 1;

        Ok(MockColumnarSession {
            response: self.response.clone(),
            inner: self.inner.clone(),
        })
    }
}

/// Session of a [`MockColumnarTransport`].
#[derive(Debug)]
pub struct MockColumnarSession {
    response: Result<Vec<u8>, ColumnarTransportError>,
    inner: Arc<Mutex<Inner>>,
}

impl ColumnarSession for MockColumnarSession {
    async fn execute_embedded_query(&self, sql: &str) -> Result<Vec<u8>, ColumnarTransportError> {
        self.inner.lock().await.queries.push(sql.to_string());
        self.response.clone()
    }

    async fn close(self) -> Result<(), ColumnarTransportError> {
        self.inner.lock().await.closed += 1;
        Ok(())
    }
}
