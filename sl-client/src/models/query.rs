use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bail;
use crate::error::{ErrorKind, SlResult};
use crate::models::ResultTable;
use crate::protocol::graphql::{WireField, WireModel};

/// Opaque server-issued identifier of an asynchronous query job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(String);

impl QueryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a query job.
///
/// Values the client does not know decode to [`QueryStatus::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
    Pending,
    Running,
    Compiled,
    Successful,
    Failed,
    #[serde(other)]
    Unknown,
}

impl QueryStatus {
    /// Returns `true` once the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStatus::Successful | QueryStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Pending => "PENDING",
            QueryStatus::Running => "RUNNING",
            QueryStatus::Compiled => "COMPILED",
            QueryStatus::Successful => "SUCCESSFUL",
            QueryStatus::Failed => "FAILED",
            QueryStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a query job, as returned by one status poll or page fetch.
///
/// `total_pages` and `encoded_table` are only guaranteed when the status is
/// [`QueryStatus::Successful`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query_id: QueryId,
    pub status: QueryStatus,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Base64 encoded Arrow IPC stream holding this page's rows.
    #[serde(default, rename = "arrowResult")]
    pub encoded_table: Option<String>,
}

impl QueryResult {
    /// Decodes the table carried by this page.
    pub fn result_table(&self) -> SlResult<ResultTable> {
        if self.status != QueryStatus::Successful {
            bail!(
                ErrorKind::InvalidData,
                "Cannot read the table of a query that is not successful",
                format!("query {} is {}", self.query_id, self.status)
            );
        }

        match &self.encoded_table {
            Some(encoded) => ResultTable::decode_base64(encoded),
            None => bail!(
                ErrorKind::InvalidData,
                "Successful query result carries no table",
                format!("query {}", self.query_id)
            ),
        }
    }
}

impl WireModel for QueryResult {
    const TYPE_NAME: &'static str = "QueryResult";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("queryId"),
            WireField::scalar("status"),
            WireField::scalar("sql"),
            WireField::scalar("error"),
            WireField::scalar("totalPages"),
            WireField::scalar("arrowResult"),
        ]
    }
}
