//! The GraphQL metadata protocol.

mod fragment;
mod operation;
mod variables;

pub use fragment::{
    FRAGMENT_PLACEHOLDER, GraphQLFragment, ModelRef, WireField, WireModel, collect_fragments,
    normalize_query, render_query,
};
pub use operation::{
    CompileSql, CreateQuery, GetQueryResult, ListDimensions, ListEntities, ListMeasures,
    ListMetrics, ListSavedQueries, ProtocolOperation, QueryResultPage,
};
pub use variables::GraphQLQuerySerializer;
