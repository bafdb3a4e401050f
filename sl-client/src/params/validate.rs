use std::collections::HashSet;

use crate::bail;
use crate::error::{ErrorKind, SlResult};
use crate::params::{
    AdhocQuery, DimensionValuesParameters, GroupByInput, GroupByKind, OrderByGroupBy,
    OrderByInput, OrderByMetric, OrderBySpec, QueryOptions, QueryParameters, SavedQueryRef,
    ValidatedQuery,
};

/// Implicit time dimension every metric can be ordered by.
pub const METRIC_TIME: &str = "metric_time";

/// Validates a parameter bag and resolves its shorthand order-by clauses.
///
/// Fails with [`ErrorKind::InvalidQuery`] before anything touches the network.
pub fn validate(params: &QueryParameters) -> SlResult<ValidatedQuery> {
    let is_adhoc = params.metrics.is_some() || params.group_by.is_some();

    match (&params.saved_query, is_adhoc) {
        (Some(_), true) => bail!(
            ErrorKind::InvalidQuery,
            "Ad-hoc and saved query parameters are mutually exclusive",
            "set either saved_query or metrics/group_by, not both"
        ),
        (None, false) => bail!(
            ErrorKind::InvalidQuery,
            "Query parameters are incomplete",
            "one of saved_query or metrics/group_by must be set"
        ),
        (Some(name), false) => {
            if name.trim().is_empty() {
                bail!(ErrorKind::InvalidQuery, "Saved query name must not be empty");
            }

            // Saved queries define their own metrics, so only structured order-bys can be checked.
            let options = validate_options(params, &HashSet::new(), &HashSet::new())?;
            Ok(ValidatedQuery::Saved(SavedQueryRef {
                name: name.clone(),
                options,
            }))
        }
        (None, true) => {
            let metrics = params.metrics.clone().unwrap_or_default();
            if metrics.is_empty() {
                bail!(
                    ErrorKind::InvalidQuery,
                    "Ad-hoc queries require at least one metric"
                );
            }

            let group_by = params.group_by.clone().unwrap_or_default();
            for input in &group_by {
                if let GroupByInput::Spec(spec) = input {
                    if spec.kind == GroupByKind::TimeDimension && spec.grain.is_none() {
                        bail!(
                            ErrorKind::InvalidQuery,
                            "Time dimension group-bys require a grain",
                            format!("group-by `{}` has no grain", spec.name)
                        );
                    }
                }
            }

            let metric_names: HashSet<&str> = metrics.iter().map(String::as_str).collect();
            let group_by_names: HashSet<&str> = group_by.iter().map(GroupByInput::name).collect();
            let options = validate_options(params, &metric_names, &group_by_names)?;

            Ok(ValidatedQuery::Adhoc(AdhocQuery {
                metrics,
                group_by,
                options,
            }))
        }
    }
}

fn validate_options(
    params: &QueryParameters,
    metric_names: &HashSet<&str>,
    group_by_names: &HashSet<&str>,
) -> SlResult<QueryOptions> {
    let order_by = match &params.order_by {
        Some(order_by) => order_by
            .iter()
            .map(|input| resolve_order_by(input, metric_names, group_by_names))
            .collect::<SlResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(QueryOptions {
        limit: params.limit,
        order_by,
        where_filters: params.where_filters.clone().unwrap_or_default(),
        read_cache: params.read_cache.unwrap_or(true),
    })
}

/// Resolves one order-by clause against the metric and group-by names of the same query.
fn resolve_order_by(
    input: &OrderByInput,
    metric_names: &HashSet<&str>,
    group_by_names: &HashSet<&str>,
) -> SlResult<OrderBySpec> {
    let shorthand = match input {
        OrderByInput::Spec(spec) => return Ok(spec.clone()),
        OrderByInput::Shorthand(shorthand) => shorthand.trim(),
    };

    let (name, descending) = if let Some(name) = shorthand.strip_prefix('-') {
        (name, true)
    } else if let Some(name) = shorthand.strip_prefix('+') {
        (name, false)
    } else {
        (shorthand, false)
    };

    let is_metric = metric_names.contains(name);
    let is_group_by = group_by_names.contains(name);

    match (is_metric, is_group_by) {
        (true, true) => bail!(
            ErrorKind::InvalidQuery,
            "Order-by clause is ambiguous",
            format!("`{name}` is both a metric and a group-by of this query")
        ),
        (true, false) => Ok(OrderBySpec::Metric(OrderByMetric {
            name: name.to_string(),
            descending,
        })),
        (false, true) => Ok(OrderBySpec::GroupBy(OrderByGroupBy {
            name: name.to_string(),
            grain: None,
            descending,
        })),
        (false, false) if name == METRIC_TIME => Ok(OrderBySpec::GroupBy(OrderByGroupBy {
            name: name.to_string(),
            grain: None,
            descending,
        })),
        (false, false) => bail!(
            ErrorKind::InvalidQuery,
            "Order-by clause does not reference a metric or group-by of this query",
            format!("cannot resolve `{shorthand}`")
        ),
    }
}

/// Validates the parameters of a dimension values lookup.
pub fn validate_dimension_values(params: &DimensionValuesParameters) -> SlResult<()> {
    if params.group_by.trim().is_empty() {
        bail!(
            ErrorKind::InvalidQuery,
            "Dimension values lookups require a group-by"
        );
    }

    Ok(())
}
