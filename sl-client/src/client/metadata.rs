use std::fmt;

use sl_config::shared::{ClientConfig, TimeoutBudget};
use tracing::{debug, info, warn};

use crate::backoff::ExponentialBackoff;
use crate::bail;
use crate::error::{ErrorKind, SlResult};
use crate::models::{
    Dimension, Entity, Measure, MetadataLookup, Metric, QueryId, QueryResult, QueryStatus,
    ResultTable, SavedQuery,
};
use crate::pager::assemble;
use crate::params::{QueryParameters, ValidatedQuery, validate};
use crate::poller::poll_until_complete;
use crate::protocol::graphql::{
    CompileSql, CreateQuery, GetQueryResult, ListDimensions, ListEntities, ListMeasures,
    ListMetrics, ListSavedQueries, ProtocolOperation, QueryResultPage,
};
use crate::runtime::Runtime;
use crate::sl_error;
use crate::transport::{GraphQLRequest, MetadataSession, MetadataTransport};

/// Client of the metadata (GraphQL) protocol.
///
/// Besides listing metadata, it runs queries end to end: the job is created, polled until it
/// reaches a terminal status and its pages are assembled into one table.
pub struct MetadataClient<T, R>
where
    T: MetadataTransport,
{
    transport: T,
    runtime: R,
    session: Option<T::Session>,
    environment_id: u64,
    lazy: bool,
    backoff: ExponentialBackoff,
    timeout: TimeoutBudget,
}

impl<T, R> fmt::Debug for MetadataClient<T, R>
where
    T: MetadataTransport + fmt::Debug,
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataClient")
            .field("transport", &self.transport)
            .field("runtime", &self.runtime)
            .field("has_session", &self.session.is_some())
            .field("environment_id", &self.environment_id)
            .field("lazy", &self.lazy)
            .field("backoff", &self.backoff)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<T, R> MetadataClient<T, R>
where
    T: MetadataTransport,
    R: Runtime,
{
    pub fn new(config: &ClientConfig, transport: T, runtime: R) -> Self {
        Self {
            transport,
            runtime,
            session: None,
            environment_id: config.environment_id,
            lazy: config.lazy_metadata,
            backoff: ExponentialBackoff::from(&config.backoff),
            timeout: config.timeout,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub async fn open_session(&mut self) -> SlResult<()> {
        if self.session.is_some() {
            bail!(
                ErrorKind::Session,
                "A session is already open",
                "close the current session before opening a new one"
            );
        }

        self.session = Some(self.transport.open().await?);
        debug!(environment_id = self.environment_id, "metadata session opened");

        Ok(())
    }

    pub async fn close_session(&mut self) -> SlResult<()> {
        let Some(session) = self.session.take() else {
            bail!(ErrorKind::Session, "No session is open");
        };

        session.close().await?;
        debug!(environment_id = self.environment_id, "metadata session closed");

        Ok(())
    }

    fn session(&self) -> SlResult<&T::Session> {
        match &self.session {
            Some(session) => Ok(session),
            None => bail!(
                ErrorKind::Session,
                "Cannot perform operation without opening a session first"
            ),
        }
    }

    /// Sends one protocol operation through the open session and decodes its response.
    async fn run<O>(&self, operation: &O, variables: &O::Variables) -> SlResult<O::Response>
    where
        O: ProtocolOperation,
    {
        let session = self.session()?;

        let request = GraphQLRequest {
            query: operation.request_text(self.lazy),
            variables: operation.request_variables(self.environment_id, variables)?,
            operation_name: Some(operation.name().to_string()),
        };
        let data = session.execute(&request).await?;

        operation.parse_response(data)
    }

    pub async fn metrics(&self) -> SlResult<Vec<Metric>> {
        self.run(&ListMetrics, &()).await
    }

    pub async fn dimensions(&self, metrics: &[String]) -> SlResult<Vec<Dimension>> {
        self.run(&ListDimensions, metrics).await
    }

    pub async fn measures(&self, metrics: &[String]) -> SlResult<Vec<Measure>> {
        self.run(&ListMeasures, metrics).await
    }

    pub async fn entities(&self, metrics: &[String]) -> SlResult<Vec<Entity>> {
        self.run(&ListEntities, metrics).await
    }

    pub async fn saved_queries(&self) -> SlResult<Vec<SavedQuery>> {
        self.run(&ListSavedQueries, &()).await
    }

    /// Submits a query job and returns its id.
    pub async fn create_query(&self, query: &ValidatedQuery) -> SlResult<QueryId> {
        let query_id = self.run(&CreateQuery, query).await?;
        info!(%query_id, "query job created");

        Ok(query_id)
    }

    /// Fetches page `page_num` of a query job, along with its current status.
    pub async fn get_query_result(&self, query_id: &QueryId, page_num: u32) -> SlResult<QueryResult> {
        let page = QueryResultPage {
            query_id: query_id.clone(),
            page_num,
        };

        self.run(&GetQueryResult, &page).await
    }

    /// Waits for `query_id` to reach a terminal status and returns its first page.
    pub async fn poll(&self, query_id: &QueryId) -> SlResult<QueryResult> {
        poll_until_complete(
            &self.runtime,
            query_id,
            &self.backoff,
            self.timeout.total(),
            move || self.get_query_result(query_id, 1),
        )
        .await
    }

    /// Returns the SQL the semantic layer would run for `params`, without running it.
    pub async fn compile_sql(&self, params: &QueryParameters) -> SlResult<String> {
        let query = validate(params)?;
        self.session()?;

        self.run(&CompileSql, &query).await
    }

    /// Runs a query and returns all of its rows.
    pub async fn query(&self, params: &QueryParameters) -> SlResult<ResultTable> {
        let query = validate(params)?;
        self.session()?;

        let query_id = self.create_query(&query).await?;
        let first_page = self.poll(&query_id).await?;

        if first_page.status == QueryStatus::Failed {
            let message = first_page
                .error
                .unwrap_or_else(|| "no error message reported".to_string());
            warn!(%query_id, error = %message, "query failed");

            return Err(sl_error!(ErrorKind::QueryFailed, "Query failed", detail = message)
                .with_query_id(query_id)
                .with_last_status(QueryStatus::Failed));
        }

        let query_id = &query_id;
        let table = assemble(self.runtime.mode(), query_id, first_page, move |page_num| {
            self.get_query_result(query_id, page_num)
        })
        .await?;

        info!(
            %query_id,
            rows = table.num_rows(),
            batches = table.batches().len(),
            "query result assembled"
        );

        Ok(table)
    }
}

impl<T, R> MetadataLookup for MetadataClient<T, R>
where
    T: MetadataTransport,
    R: Runtime,
{
    async fn dimensions(&self, metrics: &[String]) -> SlResult<Vec<Dimension>> {
        MetadataClient::dimensions(self, metrics).await
    }

    async fn measures(&self, metrics: &[String]) -> SlResult<Vec<Measure>> {
        MetadataClient::measures(self, metrics).await
    }

    async fn entities(&self, metrics: &[String]) -> SlResult<Vec<Entity>> {
        MetadataClient::entities(self, metrics).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::TimeGranularity;
    use crate::runtime::TokioRuntime;
    use crate::test_utils::arrow::{encoded_page, ids};
    use crate::test_utils::config::test_client_config;
    use crate::test_utils::metadata::{MockMetadataTransport, QueryScript};

    async fn open_client(
        script: QueryScript,
    ) -> (
        MetadataClient<MockMetadataTransport, TokioRuntime>,
        MockMetadataTransport,
    ) {
        let transport = MockMetadataTransport::new(script);
        let mut client = MetadataClient::new(&test_client_config(), transport.clone(), TokioRuntime);
        client.open_session().await.unwrap();

        (client, transport)
    }

    #[tokio::test]
    async fn test_operations_require_session() {
        let transport = MockMetadataTransport::new(QueryScript::new("q", vec![]));
        let client = MetadataClient::new(&test_client_config(), transport.clone(), TokioRuntime);

        let err = client.metrics().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);

        let err = client
            .query(&QueryParameters::adhoc(["revenue"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (mut client, transport) = open_client(QueryScript::new("q", vec![])).await;

        let err = client.open_session().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);

        client.close_session().await.unwrap();
        assert!(!client.has_session());
        assert_eq!(transport.opened().await, 1);
        assert_eq!(transport.closed().await, 1);

        let err = client.close_session().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Session);
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected_before_any_request() {
        let (client, transport) = open_client(QueryScript::new("q", vec![])).await;

        let err = client
            .query(&QueryParameters::adhoc(Vec::<String>::new()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidQuery);
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_polls_then_assembles() {
        let pages = vec![encoded_page(&[1, 2]), encoded_page(&[3])];
        let script = QueryScript::new("q-1", pages)
            .with_statuses(vec![QueryStatus::Pending, QueryStatus::Running, QueryStatus::Successful]);
        let (client, transport) = open_client(script).await;

        let table = client
            .query(&QueryParameters::adhoc(["revenue"]))
            .await
            .unwrap();

        assert_eq!(ids(table.batches()), vec![1, 2, 3]);
        assert_eq!(transport.probes().await, 3);
        assert_eq!(transport.extra_page_fetches().await, vec![2]);
        assert_eq!(
            transport.operations().await,
            vec![
                "createQuery",
                "getQueryResults",
                "getQueryResults",
                "getQueryResults",
                "getQueryResults"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_raises_query_failed() {
        let script = QueryScript::new("q-2", vec![])
            .with_statuses(vec![QueryStatus::Running, QueryStatus::Failed])
            .with_error("division by zero");
        let (client, transport) = open_client(script).await;

        let err = client
            .query(&QueryParameters::adhoc(["revenue"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert_eq!(err.detail(), Some("division by zero"));
        assert_eq!(err.query_id(), Some(&QueryId::new("q-2")));
        assert_eq!(err.last_status(), Some(QueryStatus::Failed));
        assert!(transport.extra_page_fetches().await.is_empty());
    }

    #[tokio::test]
    async fn test_compile_sql() {
        let script = QueryScript::new("q", vec![]).with_compiled_sql("SELECT revenue FROM orders");
        let (client, transport) = open_client(script).await;

        let sql = client
            .compile_sql(&QueryParameters::adhoc(["revenue"]).with_limit(5))
            .await
            .unwrap();

        assert_eq!(sql, "SELECT revenue FROM orders");

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].variables["limit"], json!(5));
        assert_eq!(requests[0].variables["metrics"], json!([{"name": "revenue"}]));
    }

    #[tokio::test]
    async fn test_list_metrics_and_lazy_loading() {
        let script = QueryScript::new("q", vec![])
            .with_listing(
                "getMetrics",
                json!({"metrics": [{
                    "name": "revenue",
                    "type": "SIMPLE",
                    "queryableGranularities": ["DAY", "FORTNIGHT"]
                }]}),
            )
            .with_listing(
                "getDimensions",
                json!({"dimensions": [{
                    "name": "country",
                    "qualifiedName": "order__country",
                    "type": "CATEGORICAL"
                }]}),
            );
        let (client, transport) = open_client(script).await;

        let mut metrics = client.metrics().await.unwrap();
        let metric = &mut metrics[0];
        assert_eq!(
            metric.queryable_granularities,
            vec![TimeGranularity::Day, TimeGranularity::Unknown]
        );
        assert!(metric.dimensions.is_none());

        let dimensions = metric.load_dimensions(&client).await.unwrap();
        assert_eq!(dimensions[0].name, "country");

        metric.load_dimensions(&client).await.unwrap();
        assert_eq!(transport.operations().await, vec!["getMetrics", "getDimensions"]);

        let requests = transport.requests().await;
        assert_eq!(requests[1].variables["metrics"], json!([{"name": "revenue"}]));
    }
}
