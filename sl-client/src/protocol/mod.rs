//! Wire encodings of validated queries.
//!
//! The same [`ValidatedQuery`] can be sent through the metadata protocol, where it becomes a map
//! of GraphQL variables, or through the columnar transport, where it becomes an embedded SQL
//! call. Both renderings sort parameters by name so requests are reproducible.

pub mod columnar;
pub mod graphql;

use crate::error::SlResult;
use crate::params::ValidatedQuery;

/// Turns a validated query into the request payload of one protocol.
pub trait QuerySerializer {
    type Output;

    fn serialize(&self, query: &ValidatedQuery) -> SlResult<Self::Output>;
}

pub use columnar::ColumnarQuerySerializer;
pub use graphql::GraphQLQuerySerializer;
