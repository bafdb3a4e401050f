use serde_json::{Map, Value, json};

use crate::error::SlResult;
use crate::params::{GroupByInput, OrderBySpec, ValidatedQuery};
use crate::protocol::QuerySerializer;

fn name_inputs(names: &[String]) -> Value {
    Value::Array(names.iter().map(|name| json!({ "name": name })).collect())
}

fn group_by_input(input: &GroupByInput) -> Value {
    match input {
        GroupByInput::Name(name) => json!({ "name": name }),
        GroupByInput::Spec(spec) => json!({
            "name": spec.name,
            "timeGranularity": spec.grain.as_deref().map(str::to_uppercase),
        }),
    }
}

fn order_by_input(spec: &OrderBySpec) -> Value {
    match spec {
        OrderBySpec::Metric(metric) => json!({
            "metric": { "name": metric.name },
            "descending": metric.descending,
        }),
        OrderBySpec::GroupBy(group_by) => json!({
            "groupBy": {
                "name": group_by.name,
                "timeGranularity": group_by.grain.as_deref().map(str::to_uppercase),
            },
            "descending": group_by.descending,
        }),
    }
}

/// Renders validated queries into the variables of the `createQuery` and `compileSql` mutations.
///
/// Every variable the mutations declare is present, with `null` for the fields of the other
/// query shape. The map is keyed in sorted order.
#[derive(Debug, Clone, Copy)]
pub struct GraphQLQuerySerializer {
    environment_id: u64,
}

impl GraphQLQuerySerializer {
    pub fn new(environment_id: u64) -> Self {
        Self { environment_id }
    }

    pub fn variables(&self, query: &ValidatedQuery) -> Map<String, Value> {
        let mut variables = Map::new();
        variables.insert("environmentId".to_string(), json!(self.environment_id));

        match query {
            ValidatedQuery::Adhoc(adhoc) => {
                variables.insert("savedQuery".to_string(), Value::Null);
                variables.insert("metrics".to_string(), name_inputs(&adhoc.metrics));
                let group_by = if adhoc.group_by.is_empty() {
                    Value::Null
                } else {
                    Value::Array(adhoc.group_by.iter().map(group_by_input).collect())
                };
                variables.insert("groupBy".to_string(), group_by);
            }
            ValidatedQuery::Saved(saved) => {
                variables.insert("savedQuery".to_string(), json!(saved.name));
                variables.insert("metrics".to_string(), Value::Null);
                variables.insert("groupBy".to_string(), Value::Null);
            }
        }

        let options = query.options();
        variables.insert(
            "where".to_string(),
            Value::Array(
                options
                    .where_filters
                    .iter()
                    .map(|sql| json!({ "sql": sql }))
                    .collect(),
            ),
        );
        variables.insert(
            "orderBy".to_string(),
            Value::Array(options.order_by.iter().map(order_by_input).collect()),
        );
        variables.insert("limit".to_string(), json!(options.limit));
        variables.insert("readCache".to_string(), json!(options.read_cache));

        variables
    }
}

impl QuerySerializer for GraphQLQuerySerializer {
    type Output = Map<String, Value>;

    fn serialize(&self, query: &ValidatedQuery) -> SlResult<Map<String, Value>> {
        Ok(self.variables(query))
    }
}

/// Variables of the operations listing objects of a set of metrics.
pub(crate) fn metric_list_variables(environment_id: u64, metrics: &[String]) -> Value {
    json!({
        "environmentId": environment_id,
        "metrics": name_inputs(metrics),
    })
}
