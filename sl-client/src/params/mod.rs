//! Query parameters accepted by the client and their validation.
//!
//! Callers build a loose [`QueryParameters`] bag; [`validate`] turns it into a
//! [`ValidatedQuery`] where every order-by clause is resolved against the selected metrics and
//! group-bys. Serializers only ever see validated queries.

mod query;
mod validate;

pub use query::{
    AdhocQuery, DimensionValuesParameters, GroupByInput, GroupByKind, GroupBySpec,
    OrderByGroupBy, OrderByInput, OrderByMetric, OrderBySpec, QueryOptions, QueryParameters,
    SavedQueryRef, ValidatedQuery,
};
pub use validate::{METRIC_TIME, validate, validate_dimension_values};
