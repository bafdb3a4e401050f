use std::fmt;

use sl_config::shared::ClientConfig;
use tracing::debug;

use crate::bail;
use crate::error::{ErrorKind, SlResult};
use crate::models::ResultTable;
use crate::params::{DimensionValuesParameters, QueryParameters, validate, validate_dimension_values};
use crate::protocol::ColumnarQuerySerializer;
use crate::transport::{ColumnarSession, ColumnarTransport};

/// Client of the columnar transport.
///
/// Queries are rendered as embedded semantic layer calls and answered synchronously with an Arrow
/// stream, so no job polling or pagination is involved. The transport connects on its own; the
/// client only reports the endpoint derived from [`ClientConfig::columnar_url`].
pub struct ColumnarClient<T>
where
    T: ColumnarTransport,
{
    transport: T,
    endpoint: String,
    session: Option<T::Session>,
    serializer: ColumnarQuerySerializer,
}

impl<T> fmt::Debug for ColumnarClient<T>
where
    T: ColumnarTransport + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnarClient")
            .field("transport", &self.transport)
            .field("endpoint", &self.endpoint)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}

impl<T> ColumnarClient<T>
where
    T: ColumnarTransport,
{
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        Self {
            transport,
            endpoint: config.columnar_url(),
            session: None,
            serializer: ColumnarQuerySerializer,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
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
        debug!(endpoint = %self.endpoint, "columnar session opened");

        Ok(())
    }

    pub async fn close_session(&mut self) -> SlResult<()> {
        let Some(session) = self.session.take() else {
            bail!(ErrorKind::Session, "No session is open");
        };

        session.close().await?;
        debug!("columnar session closed");

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

    async fn execute(&self, sql: &str) -> SlResult<ResultTable> {
        let session = self.session()?;

        debug!(sql, "executing embedded semantic layer query");
        let stream = session.execute_embedded_query(sql).await?;

        ResultTable::from_ipc_bytes(&stream)
    }

    /// Runs a query and returns all of its rows.
    pub async fn query(&self, params: &QueryParameters) -> SlResult<ResultTable> {
        let query = validate(params)?;
        let sql = self.serializer.query_sql(&query);

        self.execute(&sql).await
    }

    /// Returns the distinct values of a dimension, optionally restricted to some metrics.
    pub async fn dimension_values(
        &self,
        params: &DimensionValuesParameters,
    ) -> SlResult<ResultTable> {
        validate_dimension_values(params)?;
        let sql = self.serializer.dimension_values_sql(params);

        self.execute(&sql).await
    }
}
