use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::bail;
use crate::error::{ErrorKind, SlResult};
use crate::models::{Dimension, Entity, Measure, Metric, QueryId, QueryResult, SavedQuery};
use crate::params::ValidatedQuery;
use crate::protocol::graphql::fragment::{WireModel, normalize_query, render_query};
use crate::protocol::graphql::variables::{GraphQLQuerySerializer, metric_list_variables};

/// One request/response pair of the metadata protocol.
pub trait ProtocolOperation {
    type Variables: ?Sized;
    type Response;

    /// GraphQL operation name, sent as `operationName`.
    fn name(&self) -> &'static str;

    /// Returns the request document, omitting deferrable fields when `lazy` is set.
    fn request_text(&self, lazy: bool) -> String;

    fn request_variables(
        &self,
        environment_id: u64,
        variables: &Self::Variables,
    ) -> SlResult<Value>;

    fn parse_response(&self, data: Value) -> SlResult<Self::Response>;
}

/// Extracts and decodes the top-level field `field` of a response's `data`.
fn decode_field<T: DeserializeOwned>(mut data: Value, field: &str) -> SlResult<T> {
    let Some(value) = data.get_mut(field).map(Value::take) else {
        bail!(
            ErrorKind::DeserializationError,
            "Metadata response is missing a field",
            format!("expected field `{field}`")
        );
    };

    Ok(serde_json::from_value(value)?)
}

const LIST_METRICS: &str = "
query getMetrics($environmentId: BigInt!) {
    metrics(environmentId: $environmentId) {
        ...&fragment
    }
}";

const LIST_DIMENSIONS: &str = "
query getDimensions($environmentId: BigInt!, $metrics: [MetricInput!]!) {
    dimensions(environmentId: $environmentId, metrics: $metrics) {
        ...&fragment
    }
}";

const LIST_MEASURES: &str = "
query getMeasures($environmentId: BigInt!, $metrics: [MetricInput!]!) {
    measures(environmentId: $environmentId, metrics: $metrics) {
        ...&fragment
    }
}";

const LIST_ENTITIES: &str = "
query getEntities($environmentId: BigInt!, $metrics: [MetricInput!]!) {
    entities(environmentId: $environmentId, metrics: $metrics) {
        ...&fragment
    }
}";

const LIST_SAVED_QUERIES: &str = "
query getSavedQueries($environmentId: BigInt!) {
    savedQueries(environmentId: $environmentId) {
        ...&fragment
    }
}";

const CREATE_QUERY: &str = "
mutation createQuery(
    $environmentId: BigInt!,
    $savedQuery: String,
    $metrics: [MetricInput!],
    $groupBy: [GroupByInput!],
    $where: [WhereInput!]!,
    $orderBy: [OrderByInput!]!,
    $limit: Int,
    $readCache: Boolean,
) {
    createQuery(
        environmentId: $environmentId,
        savedQuery: $savedQuery,
        metrics: $metrics,
        groupBy: $groupBy,
        where: $where,
        orderBy: $orderBy,
        limit: $limit,
        readCache: $readCache,
    ) {
        queryId
    }
}";

const GET_QUERY_RESULTS: &str = "
query getQueryResults(
    $environmentId: BigInt!,
    $queryId: String!,
    $pageNum: Int!
) {
    query(environmentId: $environmentId, queryId: $queryId, pageNum: $pageNum) {
        ...&fragment
    }
}";

const COMPILE_SQL: &str = "
mutation compileSql(
    $environmentId: BigInt!,
    $savedQuery: String,
    $metrics: [MetricInput!],
    $groupBy: [GroupByInput!],
    $where: [WhereInput!]!,
    $orderBy: [OrderByInput!]!,
    $limit: Int,
    $readCache: Boolean,
) {
    compileSql(
        environmentId: $environmentId,
        savedQuery: $savedQuery,
        metrics: $metrics,
        groupBy: $groupBy,
        where: $where,
        orderBy: $orderBy,
        limit: $limit,
        readCache: $readCache,
    ) {
        sql
    }
}";

/// Lists every metric of the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListMetrics;

impl ProtocolOperation for ListMetrics {
    type Variables = ();
    type Response = Vec<Metric>;

    fn name(&self) -> &'static str {
        "getMetrics"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(LIST_METRICS, &Metric::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, _variables: &()) -> SlResult<Value> {
        Ok(json!({ "environmentId": environment_id }))
    }

    fn parse_response(&self, data: Value) -> SlResult<Vec<Metric>> {
        decode_field(data, "metrics")
    }
}

/// Lists the dimensions available to a set of metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDimensions;

impl ProtocolOperation for ListDimensions {
    type Variables = [String];
    type Response = Vec<Dimension>;

    fn name(&self) -> &'static str {
        "getDimensions"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(LIST_DIMENSIONS, &Dimension::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, metrics: &[String]) -> SlResult<Value> {
        Ok(metric_list_variables(environment_id, metrics))
    }

    fn parse_response(&self, data: Value) -> SlResult<Vec<Dimension>> {
        decode_field(data, "dimensions")
    }
}

/// Lists the measures a set of metrics are built from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListMeasures;

impl ProtocolOperation for ListMeasures {
    type Variables = [String];
    type Response = Vec<Measure>;

    fn name(&self) -> &'static str {
        "getMeasures"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(LIST_MEASURES, &Measure::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, metrics: &[String]) -> SlResult<Value> {
        Ok(metric_list_variables(environment_id, metrics))
    }

    fn parse_response(&self, data: Value) -> SlResult<Vec<Measure>> {
        decode_field(data, "measures")
    }
}

/// Lists the entities available to a set of metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListEntities;

impl ProtocolOperation for ListEntities {
    type Variables = [String];
    type Response = Vec<Entity>;

    fn name(&self) -> &'static str {
        "getEntities"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(LIST_ENTITIES, &Entity::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, metrics: &[String]) -> SlResult<Value> {
        Ok(metric_list_variables(environment_id, metrics))
    }

    fn parse_response(&self, data: Value) -> SlResult<Vec<Entity>> {
        decode_field(data, "entities")
    }
}

/// Lists every saved query of the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSavedQueries;

impl ProtocolOperation for ListSavedQueries {
    type Variables = ();
    type Response = Vec<SavedQuery>;

    fn name(&self) -> &'static str {
        "getSavedQueries"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(LIST_SAVED_QUERIES, &SavedQuery::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, _variables: &()) -> SlResult<Value> {
        Ok(json!({ "environmentId": environment_id }))
    }

    fn parse_response(&self, data: Value) -> SlResult<Vec<SavedQuery>> {
        decode_field(data, "savedQueries")
    }
}

/// Submits a query job.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateQuery;

impl ProtocolOperation for CreateQuery {
    type Variables = ValidatedQuery;
    type Response = QueryId;

    fn name(&self) -> &'static str {
        "createQuery"
    }

    fn request_text(&self, _lazy: bool) -> String {
        normalize_query(CREATE_QUERY)
    }

    fn request_variables(&self, environment_id: u64, query: &ValidatedQuery) -> SlResult<Value> {
        Ok(Value::Object(
            GraphQLQuerySerializer::new(environment_id).variables(query),
        ))
    }

    fn parse_response(&self, data: Value) -> SlResult<QueryId> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct CreateQueryResult {
            query_id: QueryId,
        }

        let result: CreateQueryResult = decode_field(data, "createQuery")?;
        Ok(result.query_id)
    }
}

/// Selects one page of a query job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResultPage {
    pub query_id: QueryId,
    /// One-based page number.
    pub page_num: u32,
}

/// Fetches the status and, once successful, one page of results of a query job.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetQueryResult;

impl ProtocolOperation for GetQueryResult {
    type Variables = QueryResultPage;
    type Response = QueryResult;

    fn name(&self) -> &'static str {
        "getQueryResults"
    }

    fn request_text(&self, lazy: bool) -> String {
        render_query(GET_QUERY_RESULTS, &QueryResult::fragments(lazy))
    }

    fn request_variables(&self, environment_id: u64, page: &QueryResultPage) -> SlResult<Value> {
        Ok(json!({
            "environmentId": environment_id,
            "queryId": page.query_id,
            "pageNum": page.page_num,
        }))
    }

    fn parse_response(&self, data: Value) -> SlResult<QueryResult> {
        decode_field(data, "query")
    }
}

/// Compiles a query to the SQL the warehouse would run, without executing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileSql;

impl ProtocolOperation for CompileSql {
    type Variables = ValidatedQuery;
    type Response = String;

    fn name(&self) -> &'static str {
        "compileSql"
    }

    fn request_text(&self, _lazy: bool) -> String {
        normalize_query(COMPILE_SQL)
    }

    fn request_variables(&self, environment_id: u64, query: &ValidatedQuery) -> SlResult<Value> {
        Ok(Value::Object(
            GraphQLQuerySerializer::new(environment_id).variables(query),
        ))
    }

    fn parse_response(&self, data: Value) -> SlResult<String> {
        #[derive(serde::Deserialize)]
        struct CompileSqlResult {
            sql: String,
        }

        let result: CompileSqlResult = decode_field(data, "compileSql")?;
        Ok(result.sql)
    }
}
