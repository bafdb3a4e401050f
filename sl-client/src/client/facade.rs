use futures::executor::block_on;
use sl_config::shared::ClientConfig;
use tracing::{info, warn};

use crate::client::columnar::ColumnarClient;
use crate::client::metadata::MetadataClient;
use crate::client::routing::{Backend, Operation, RoutingTable};
use crate::error::{SlError, SlResult};
use crate::models::{
    Dimension, Entity, Measure, MetadataLookup, Metric, ResultTable, SavedQuery,
};
use crate::params::{DimensionValuesParameters, QueryParameters};
use crate::runtime::{BlockingRuntime, Runtime};
use crate::transport::{BlockingMetadataTransport, ColumnarTransport, MetadataTransport};

/// Client exposing the operations of both protocols.
///
/// Every call is dispatched to the backend its [`Operation`] is routed to. Sessions of both
/// backends are opened and closed together, and every operation fails with
/// [`crate::error::ErrorKind::Session`] while they are closed.
#[derive(Debug)]
pub struct SemanticLayerClient<M, C, R>
where
    M: MetadataTransport,
    C: ColumnarTransport,
{
    metadata: MetadataClient<M, R>,
    columnar: ColumnarClient<C>,
    routes: RoutingTable,
}

impl<M, C, R> SemanticLayerClient<M, C, R>
where
    M: MetadataTransport,
    C: ColumnarTransport,
    R: Runtime,
{
    pub fn new(
        config: &ClientConfig,
        metadata_transport: M,
        columnar_transport: C,
        runtime: R,
    ) -> Self {
        Self {
            metadata: MetadataClient::new(config, metadata_transport, runtime),
            columnar: ColumnarClient::new(config, columnar_transport),
            routes: RoutingTable::default(),
        }
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Routes `operation` to `backend`, see [`RoutingTable::set_route`].
    pub fn set_route(&mut self, operation: Operation, backend: Backend) -> SlResult<()> {
        self.routes.set_route(operation, backend)?;
        info!(%operation, %backend, "operation routed");

        Ok(())
    }

    pub fn has_session(&self) -> bool {
        self.metadata.has_session() && self.columnar.has_session()
    }

    /// Opens a session on both backends.
    ///
    /// If the columnar session cannot be opened, the metadata session is closed again.
    pub async fn open_session(&mut self) -> SlResult<()> {
        self.metadata.open_session().await?;

        if let Err(err) = self.columnar.open_session().await {
            if let Err(close_err) = self.metadata.close_session().await {
                warn!(error = %close_err, "failed to close metadata session after open failure");
            }

            return Err(err);
        }

        Ok(())
    }

    /// Closes the sessions of both backends, attempting both even if one fails.
    pub async fn close_session(&mut self) -> SlResult<()> {
        let errors: Vec<SlError> = [
            self.metadata.close_session().await,
            self.columnar.close_session().await,
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            return Ok(());
        }

        Err(SlError::from(errors))
    }

    pub async fn metrics(&self) -> SlResult<Vec<Metric>> {
        self.routes.ensure(Operation::Metrics, Backend::Metadata)?;
        self.metadata.metrics().await
    }

    pub async fn dimensions(&self, metrics: &[String]) -> SlResult<Vec<Dimension>> {
        self.routes.ensure(Operation::Dimensions, Backend::Metadata)?;
        self.metadata.dimensions(metrics).await
    }

    pub async fn measures(&self, metrics: &[String]) -> SlResult<Vec<Measure>> {
        self.routes.ensure(Operation::Measures, Backend::Metadata)?;
        self.metadata.measures(metrics).await
    }

    pub async fn entities(&self, metrics: &[String]) -> SlResult<Vec<Entity>> {
        self.routes.ensure(Operation::Entities, Backend::Metadata)?;
        self.metadata.entities(metrics).await
    }

    pub async fn saved_queries(&self) -> SlResult<Vec<SavedQuery>> {
        self.routes.ensure(Operation::SavedQueries, Backend::Metadata)?;
        self.metadata.saved_queries().await
    }

    pub async fn compile_sql(&self, params: &QueryParameters) -> SlResult<String> {
        self.routes.ensure(Operation::CompileSql, Backend::Metadata)?;
        self.metadata.compile_sql(params).await
    }

    /// Runs a query on the backend [`Operation::Query`] is routed to.
    pub async fn query(&self, params: &QueryParameters) -> SlResult<ResultTable> {
        match self.routes.route(Operation::Query) {
            Backend::Metadata => self.metadata.query(params).await,
            Backend::Columnar => self.columnar.query(params).await,
        }
    }

    pub async fn dimension_values(
        &self,
        params: &DimensionValuesParameters,
    ) -> SlResult<ResultTable> {
        self.routes
            .ensure(Operation::DimensionValues, Backend::Columnar)?;
        self.columnar.dimension_values(params).await
    }
}

impl<M, C, R> MetadataLookup for SemanticLayerClient<M, C, R>
where
    M: MetadataTransport,
    C: ColumnarTransport,
    R: Runtime,
{
    async fn dimensions(&self, metrics: &[String]) -> SlResult<Vec<Dimension>> {
        SemanticLayerClient::dimensions(self, metrics).await
    }

    async fn measures(&self, metrics: &[String]) -> SlResult<Vec<Measure>> {
        SemanticLayerClient::measures(self, metrics).await
    }

    async fn entities(&self, metrics: &[String]) -> SlResult<Vec<Entity>> {
        SemanticLayerClient::entities(self, metrics).await
    }
}

/// Blocking variant of [`SemanticLayerClient`].
///
/// Runs the same algorithms on the calling thread: sleeps between polls block and result pages
/// are fetched one after another. It must not be used from within an async runtime.
///
/// The metadata transport must be a [`BlockingMetadataTransport`], for example
/// [`crate::transport::BlockingHttpGraphQLTransport`]. The columnar transport must likewise
/// complete its calls without a tokio reactor.
#[derive(Debug)]
pub struct BlockingSemanticLayerClient<M, C>
where
    M: BlockingMetadataTransport,
    C: ColumnarTransport,
{
    inner: SemanticLayerClient<M, C, BlockingRuntime>,
}

impl<M, C> BlockingSemanticLayerClient<M, C>
where
    M: BlockingMetadataTransport,
    C: ColumnarTransport,
{
    pub fn new(config: &ClientConfig, metadata_transport: M, columnar_transport: C) -> Self {
        Self {
            inner: SemanticLayerClient::new(
                config,
                metadata_transport,
                columnar_transport,
                BlockingRuntime,
            ),
        }
    }

    pub fn routes(&self) -> &RoutingTable {
        self.inner.routes()
    }

    pub fn set_route(&mut self, operation: Operation, backend: Backend) -> SlResult<()> {
        self.inner.set_route(operation, backend)
    }

    pub fn has_session(&self) -> bool {
        self.inner.has_session()
    }

    pub fn open_session(&mut self) -> SlResult<()> {
        block_on(self.inner.open_session())
    }

    pub fn close_session(&mut self) -> SlResult<()> {
        block_on(self.inner.close_session())
    }

    pub fn metrics(&self) -> SlResult<Vec<Metric>> {
        block_on(self.inner.metrics())
    }

    pub fn dimensions(&self, metrics: &[String]) -> SlResult<Vec<Dimension>> {
        block_on(self.inner.dimensions(metrics))
    }

    pub fn measures(&self, metrics: &[String]) -> SlResult<Vec<Measure>> {
        block_on(self.inner.measures(metrics))
    }

    pub fn entities(&self, metrics: &[String]) -> SlResult<Vec<Entity>> {
        block_on(self.inner.entities(metrics))
    }

    pub fn saved_queries(&self) -> SlResult<Vec<SavedQuery>> {
        block_on(self.inner.saved_queries())
    }

    pub fn compile_sql(&self, params: &QueryParameters) -> SlResult<String> {
        block_on(self.inner.compile_sql(params))
    }

    pub fn query(&self, params: &QueryParameters) -> SlResult<ResultTable> {
        block_on(self.inner.query(params))
    }

    pub fn dimension_values(&self, params: &DimensionValuesParameters) -> SlResult<ResultTable> {
        block_on(self.inner.dimension_values(params))
    }

    /// Fills in the dimensions of a metric listed in lazy mode.
    pub fn load_dimensions<'a>(&self, metric: &'a mut Metric) -> SlResult<&'a [Dimension]> {
        block_on(metric.load_dimensions(&self.inner))
    }

    /// Fills in the measures of a metric listed in lazy mode.
    pub fn load_measures<'a>(&self, metric: &'a mut Metric) -> SlResult<&'a [Measure]> {
        block_on(metric.load_measures(&self.inner))
    }

    /// Fills in the entities of a metric listed in lazy mode.
    pub fn load_entities<'a>(&self, metric: &'a mut Metric) -> SlResult<&'a [Entity]> {
        block_on(metric.load_entities(&self.inner))
    }
}
