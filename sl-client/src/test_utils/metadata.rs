use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::error::{ErrorKind, SlResult};
use crate::models::{QueryId, QueryStatus};
use crate::sl_error;
use crate::transport::{
    BlockingMetadataTransport, GraphQLRequest, MetadataSession, MetadataTransport,
};

/// Behavior of the scripted metadata server.
#[derive(Debug, Clone)]
pub struct QueryScript {
    query_id: QueryId,
    statuses: Vec<QueryStatus>,
    pages: Vec<String>,
    error: Option<String>,
    compiled_sql: String,
    listings: HashMap<String, Value>,
    failing_pages: HashSet<u32>,
    page_delays: HashMap<u32, Duration>,
}

impl QueryScript {
    /// Creates a script whose job succeeds on the first probe with the given encoded pages.
    pub fn new(query_id: &str, pages: Vec<String>) -> Self {
        Self {
            query_id: QueryId::new(query_id),
            statuses: vec![QueryStatus::Successful],
            pages,
            error: None,
            compiled_sql: "SELECT 1".to_string(),
            listings: HashMap::new(),
            failing_pages: HashSet::new(),
            page_delays: HashMap::new(),
        }
    }

    /// Sets the statuses returned by successive status probes. The last one repeats.
    pub fn with_statuses(mut self, statuses: Vec<QueryStatus>) -> Self {
        self.statuses = statuses;
        self
    }

    /// Sets the server error message reported once the job failed.
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_compiled_sql(mut self, sql: &str) -> Self {
        self.compiled_sql = sql.to_string();
        self
    }

    /// Sets the `data` returned for a listing operation such as `getMetrics`.
    pub fn with_listing(mut self, operation_name: &str, data: Value) -> Self {
        self.listings.insert(operation_name.to_string(), data);
        self
    }

    /// Makes fetches of page `page_num` fail with a transport error.
    pub fn with_failing_page(mut self, page_num: u32) -> Self {
        self.failing_pages.insert(page_num);
        self
    }

    /// Delays the response to fetches of page `page_num`.
    pub fn with_page_delay(mut self, page_num: u32, delay: Duration) -> Self {
        self.page_delays.insert(page_num, delay);
        self
    }
}

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<GraphQLRequest>,
    probes: usize,
    opened: usize,
    closed: usize,
}

/// Metadata transport answering from a [`QueryScript`] and recording every request.
#[derive(Debug, Clone)]
pub struct MockMetadataTransport {
    script: Arc<QueryScript>,
    inner: Arc<Mutex<Inner>>,
}

impl MockMetadataTransport {
    pub fn new(script: QueryScript) -> Self {
        Self {
            script: Arc::new(script),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn requests(&self) -> Vec<GraphQLRequest> {
        self.inner.lock().await.requests.clone()
    }

    /// Returns the operation names of all requests, in issue order.
    pub async fn operations(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .requests
            .iter()
            .filter_map(|request| request.operation_name.clone())
            .collect()
    }

    /// Returns the page numbers of every fetch beyond the first page, in issue order.
    pub async fn extra_page_fetches(&self) -> Vec<u32> {
        self.inner
            .lock()
            .await
            .requests
            .iter()
            .filter_map(page_num)
            .filter(|page_num| *page_num > 1)
            .collect()
    }

    /// Returns how many times the job status was probed.
    pub async fn probes(&self) -> usize {
        self.inner.lock().await.probes
    }

    pub async fn opened(&self) -> usize {
        self.inner.lock().await.opened
    }

    pub async fn closed(&self) -> usize {
        self.inner.lock().await.closed
    }
}

// Scripted page delays sleep on tokio and need a runtime even under the blocking client.
impl BlockingMetadataTransport for MockMetadataTransport {}

impl MetadataTransport for MockMetadataTransport {
    type Session = MockMetadataSession;

    async fn open(&self) -> SlResult<MockMetadataSession> {
        self.inner.lock().await.opened += 1;

        Ok(MockMetadataSession {
            script: self.script.clone(),
            inner: self.inner.clone(),
        })
    }
}

fn page_num(request: &GraphQLRequest) -> Option<u32> {
    if request.operation_name.as_deref() != Some("getQueryResults") {
        return None;
    }

    request
        .variables
        .get("pageNum")
        .and_then(Value::as_u64)
        .map(|page_num| page_num as u32)
}

/// Session of a [`MockMetadataTransport`].
#[derive(Debug)]
pub struct MockMetadataSession {
    script: Arc<QueryScript>,
    inner: Arc<Mutex<Inner>>,
}

impl MockMetadataSession {
    fn query_result(&self, page_num: u32, probe: usize) -> SlResult<Value> {
        let script = &self.script;

        if page_num > 1 {
            if script.failing_pages.contains(&page_num) {
                return Err(sl_error!(
                    ErrorKind::Transport,
                    "Semantic layer request failed",
                    format!("page {page_num} is unavailable")
                ));
            }

            let Some(page) = script.pages.get(page_num as usize - 1) else {
                return Err(sl_error!(
                    ErrorKind::Transport,
                    "Semantic layer request failed",
                    format!("page {page_num} does not exist")
                ));
            };

            return Ok(json!({
                "query": {
                    "queryId": script.query_id,
                    "status": "SUCCESSFUL",
                    "sql": null,
                    "error": null,
                    "totalPages": script.pages.len(),
                    "arrowResult": page,
                }
            }));
        }

        let status = script
            .statuses
            .get(probe)
            .or(script.statuses.last())
            .copied()
            .unwrap_or(QueryStatus::Successful);

        let (total_pages, arrow_result, error) = match status {
            QueryStatus::Successful => (
                Some(script.pages.len()),
                script.pages.first().cloned(),
                None,
            ),
            QueryStatus::Failed => (None, None, script.error.clone()),
            _ => (None, None, None),
        };

        let status = match status {
            QueryStatus::Unknown => "SOMETHING_NEW".to_string(),
            status => status.to_string(),
        };

        Ok(json!({
            "query": {
                "queryId": script.query_id,
                "status": status,
                "sql": null,
                "error": error,
                "totalPages": total_pages,
                "arrowResult": arrow_result,
            }
        }))
    }
}

impl MetadataSession for MockMetadataSession {
    async fn execute(&self, request: &GraphQLRequest) -> SlResult<Value> {
        let page_num = page_num(request);

        let probe = {
            let mut inner = self.inner.lock().await;
            inner.requests.push(request.clone());

            let probe = inner.probes;
            if page_num == Some(1) {
                inner.probes += 1;
            }
            probe
        };

        if let Some(delay) = page_num.and_then(|page_num| self.script.page_delays.get(&page_num)) {
            tokio::time::sleep(*delay).await;
        }

        match request.operation_name.as_deref() {
            Some("createQuery") => Ok(json!({
                "createQuery": { "queryId": self.script.query_id }
            })),
            Some("compileSql") => Ok(json!({
                "compileSql": { "sql": self.script.compiled_sql }
            })),
            Some("getQueryResults") => self.query_result(page_num.unwrap_or(1), probe),
            Some(operation) => match self.script.listings.get(operation) {
                Some(data) => Ok(data.clone()),
                None => Err(sl_error!(
                    ErrorKind::Transport,
                    "Metadata request returned errors",
                    format!("no scripted response for `{operation}`")
                )),
            },
            None => Err(sl_error!(
                ErrorKind::Transport,
                "Metadata request returned errors",
                "request has no operation name"
            )),
        }
    }

    async fn close(self) -> SlResult<()> {
        self.inner.lock().await.closed += 1;
        Ok(())
    }
}
