//! Typed records exchanged with the semantic layer.

mod dimension;
mod entity;
mod measure;
mod metric;
mod query;
mod saved_query;
mod table;
mod time;

pub use dimension::{Dimension, DimensionType};
pub use entity::{Entity, EntityType};
pub use measure::{AggregationType, Measure};
pub use metric::{Metric, MetricType, MetadataLookup};
pub use query::{QueryId, QueryResult, QueryStatus};
pub use saved_query::{
    Export, ExportConfig, ExportDestinationType, SavedQuery, SavedQueryGroupByParam,
    SavedQueryMetricParam, SavedQueryQueryParams, SavedQueryWhereParam,
};
pub use table::ResultTable;
pub use time::{DatePart, TimeGranularity};
