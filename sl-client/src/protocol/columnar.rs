use std::collections::BTreeMap;
use std::fmt;

use crate::error::SlResult;
use crate::params::{
    DimensionValuesParameters, GroupByInput, GroupByKind, OrderBySpec, ValidatedQuery,
};
use crate::protocol::QuerySerializer;

/// A value in the embedded call grammar understood by the columnar endpoint.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Bool(bool),
    Int(u64),
    Str(String),
    List(Vec<Literal>),
    /// An already rendered constructor call such as `Metric("a")`.
    Call(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Str(value) => write!(f, "{}", quote(value)),
            Literal::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Literal::Call(call) => f.write_str(call),
        }
    }
}

/// Quotes and escapes a string the way a JSON encoder does.
fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn group_by_literal(input: &GroupByInput) -> Literal {
    let spec = match input {
        GroupByInput::Name(name) => return Literal::Str(name.clone()),
        GroupByInput::Spec(spec) => spec,
    };

    let grain = spec.grain.as_deref().map(str::to_lowercase);
    let call = match (spec.kind, grain) {
        (GroupByKind::TimeDimension, Some(grain)) => {
            format!("TimeDimension({},{})", quote(&spec.name), quote(&grain))
        }
        (GroupByKind::Entity, _) => format!("Entity({})", quote(&spec.name)),
        (_, Some(grain)) => format!("Dimension({}).grain({})", quote(&spec.name), quote(&grain)),
        (_, None) => format!("Dimension({})", quote(&spec.name)),
    };

    Literal::Call(call)
}

fn order_by_literal(spec: &OrderBySpec) -> Literal {
    let mut call = match spec {
        OrderBySpec::Metric(metric) => format!("Metric({})", quote(&metric.name)),
        OrderBySpec::GroupBy(group_by) => {
            let mut call = format!("Dimension({})", quote(&group_by.name));
            if let Some(grain) = &group_by.grain {
                call.push_str(&format!(".grain({})", quote(&grain.to_lowercase())));
            }
            call
        }
    };

    if spec.is_descending() {
        call.push_str(".descending(True)");
    }

    Literal::Call(call)
}

fn string_list(values: &[String]) -> Literal {
    Literal::List(values.iter().cloned().map(Literal::Str).collect())
}

/// Renders the named arguments in name order, skipping absent ones.
fn render_arguments(arguments: BTreeMap<&'static str, Literal>) -> String {
    arguments
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders validated queries into the embedded SQL understood by the columnar endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnarQuerySerializer;

impl ColumnarQuerySerializer {
    /// Renders the argument list of a `semantic_layer.query` call.
    pub fn query_arguments(&self, query: &ValidatedQuery) -> String {
        let mut arguments = BTreeMap::new();

        match query {
            ValidatedQuery::Adhoc(adhoc) => {
                arguments.insert("metrics", string_list(&adhoc.metrics));
                if !adhoc.group_by.is_empty() {
                    arguments.insert(
                        "group_by",
                        Literal::List(adhoc.group_by.iter().map(group_by_literal).collect()),
                    );
                }
            }
            ValidatedQuery::Saved(saved) => {
                arguments.insert("saved_query", Literal::Str(saved.name.clone()));
            }
        }

        let options = query.options();
        if let Some(limit) = options.limit {
            arguments.insert("limit", Literal::Int(limit));
        }
        if !options.order_by.is_empty() {
            arguments.insert(
                "order_by",
                Literal::List(options.order_by.iter().map(order_by_literal).collect()),
            );
        }
        if !options.where_filters.is_empty() {
            arguments.insert("where", string_list(&options.where_filters));
        }
        arguments.insert("read_cache", Literal::Bool(options.read_cache));

        render_arguments(arguments)
    }

    /// Returns the full SQL statement running `query`.
    pub fn query_sql(&self, query: &ValidatedQuery) -> String {
        format!(
            "SELECT * FROM {{{{ semantic_layer.query({}) }}}}",
            self.query_arguments(query)
        )
    }

    /// Returns the SQL statement listing the values of a dimension.
    pub fn dimension_values_sql(&self, params: &DimensionValuesParameters) -> String {
        let mut arguments = BTreeMap::new();
        arguments.insert("group_by", Literal::Str(params.group_by.clone()));
        if !params.metrics.is_empty() {
            arguments.insert("metrics", string_list(&params.metrics));
        }

        format!(
            "SELECT * FROM {{{{ semantic_layer.dimension_values({}) }}}}",
            render_arguments(arguments)
        )
    }
}

impl QuerySerializer for ColumnarQuerySerializer {
    type Output = String;

    fn serialize(&self, query: &ValidatedQuery) -> SlResult<String> {
        Ok(self.query_sql(query))
    }
}
