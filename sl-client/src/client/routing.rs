use std::collections::HashMap;
use std::fmt;

use crate::bail;
use crate::error::{ErrorKind, SlResult};

/// Operations exposed by [`crate::client::SemanticLayerClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Metrics,
    Dimensions,
    Measures,
    Entities,
    SavedQueries,
    CompileSql,
    Query,
    DimensionValues,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Metrics,
        Operation::Dimensions,
        Operation::Measures,
        Operation::Entities,
        Operation::SavedQueries,
        Operation::CompileSql,
        Operation::Query,
        Operation::DimensionValues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Metrics => "metrics",
            Operation::Dimensions => "dimensions",
            Operation::Measures => "measures",
            Operation::Entities => "entities",
            Operation::SavedQueries => "saved_queries",
            Operation::CompileSql => "compile_sql",
            Operation::Query => "query",
            Operation::DimensionValues => "dimension_values",
        }
    }

    /// Returns the backends able to serve this operation.
    pub fn backends(&self) -> &'static [Backend] {
        match self {
            Operation::Query => &[Backend::Metadata, Backend::Columnar],
            Operation::DimensionValues => &[Backend::Columnar],
            _ => &[Backend::Metadata],
        }
    }

    pub fn default_backend(&self) -> Backend {
        match self {
            Operation::DimensionValues => Backend::Columnar,
            _ => Backend::Metadata,
        }
    }

    pub fn supports(&self, backend: Backend) -> bool {
        self.backends().contains(&backend)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol backends of the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// GraphQL metadata protocol.
    Metadata,
    /// Arrow based columnar transport.
    Columnar,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Metadata => f.write_str("metadata"),
            Backend::Columnar => f.write_str("columnar"),
        }
    }
}

/// Maps every operation to the backend currently serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    routes: HashMap<Operation, Backend>,
}

impl RoutingTable {
    pub fn route(&self, operation: Operation) -> Backend {
        self.routes
            .get(&operation)
            .copied()
            .unwrap_or_else(|| operation.default_backend())
    }

    /// Routes `operation` to `backend`.
    ///
    /// Fails with [`ErrorKind::UnsupportedOperation`] if `backend` cannot serve `operation`.
    pub fn set_route(&mut self, operation: Operation, backend: Backend) -> SlResult<()> {
        if !operation.supports(backend) {
            bail!(
                ErrorKind::UnsupportedOperation,
                "Operation is not available on this backend",
                format!("`{operation}` cannot be served by the {backend} backend")
            );
        }

        self.routes.insert(operation, backend);

        Ok(())
    }

    /// Fails unless `operation` is currently routed to `backend`.
    pub fn ensure(&self, operation: Operation, backend: Backend) -> SlResult<()> {
        let current = self.route(operation);
        if current != backend {
            bail!(
                ErrorKind::UnsupportedOperation,
                "Operation is not available on this backend",
                format!("`{operation}` is routed to the {current} backend")
            );
        }

        Ok(())
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        let routes = Operation::ALL
            .into_iter()
            .map(|operation| (operation, operation.default_backend()))
            .collect();

        Self { routes }
    }
}
