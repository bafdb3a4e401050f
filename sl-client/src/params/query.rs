use serde::{Deserialize, Serialize};

/// Kind of a structured group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupByKind {
    Dimension,
    Entity,
    TimeDimension,
}

/// A group-by with explicit kind and optional grain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupBySpec {
    pub name: String,
    pub kind: GroupByKind,
    #[serde(default)]
    pub grain: Option<String>,
}

impl GroupBySpec {
    pub fn dimension(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupByKind::Dimension,
            grain: None,
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupByKind::Entity,
            grain: None,
        }
    }

    pub fn time_dimension(name: impl Into<String>, grain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupByKind::TimeDimension,
            grain: Some(grain.into()),
        }
    }

    pub fn with_grain(mut self, grain: impl Into<String>) -> Self {
        self.grain = Some(grain.into());
        self
    }
}

/// A group-by as given by the caller: either a bare name or a structured spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupByInput {
    Name(String),
    Spec(GroupBySpec),
}

impl GroupByInput {
    pub fn name(&self) -> &str {
        match self {
            GroupByInput::Name(name) => name,
            GroupByInput::Spec(spec) => &spec.name,
        }
    }

    pub fn grain(&self) -> Option<&str> {
        match self {
            GroupByInput::Name(_) => None,
            GroupByInput::Spec(spec) => spec.grain.as_deref(),
        }
    }
}

impl From<&str> for GroupByInput {
    fn from(value: &str) -> Self {
        GroupByInput::Name(value.to_string())
    }
}

impl From<String> for GroupByInput {
    fn from(value: String) -> Self {
        GroupByInput::Name(value)
    }
}

impl From<GroupBySpec> for GroupByInput {
    fn from(value: GroupBySpec) -> Self {
        GroupByInput::Spec(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderByMetric {
    pub name: String,
    #[serde(default)]
    pub descending: bool,
}

impl OrderByMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderByGroupBy {
    pub name: String,
    #[serde(default)]
    pub grain: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

impl OrderByGroupBy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grain: None,
            descending: false,
        }
    }

    pub fn with_grain(mut self, grain: impl Into<String>) -> Self {
        self.grain = Some(grain.into());
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }
}

/// A resolved order-by clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBySpec {
    Metric(OrderByMetric),
    GroupBy(OrderByGroupBy),
}

impl OrderBySpec {
    pub fn name(&self) -> &str {
        match self {
            OrderBySpec::Metric(metric) => &metric.name,
            OrderBySpec::GroupBy(group_by) => &group_by.name,
        }
    }

    pub fn is_descending(&self) -> bool {
        match self {
            OrderBySpec::Metric(metric) => metric.descending,
            OrderBySpec::GroupBy(group_by) => group_by.descending,
        }
    }
}

impl From<OrderByMetric> for OrderBySpec {
    fn from(value: OrderByMetric) -> Self {
        OrderBySpec::Metric(value)
    }
}

impl From<OrderByGroupBy> for OrderBySpec {
    fn from(value: OrderByGroupBy) -> Self {
        OrderBySpec::GroupBy(value)
    }
}

/// An order-by as given by the caller.
///
/// The shorthand form is a name with an optional leading `+` (ascending) or `-` (descending).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderByInput {
    Shorthand(String),
    Spec(OrderBySpec),
}

impl From<&str> for OrderByInput {
    fn from(value: &str) -> Self {
        OrderByInput::Shorthand(value.to_string())
    }
}

impl From<String> for OrderByInput {
    fn from(value: String) -> Self {
        OrderByInput::Shorthand(value)
    }
}

impl From<OrderBySpec> for OrderByInput {
    fn from(value: OrderBySpec) -> Self {
        OrderByInput::Spec(value)
    }
}

impl From<OrderByMetric> for OrderByInput {
    fn from(value: OrderByMetric) -> Self {
        OrderByInput::Spec(value.into())
    }
}

impl From<OrderByGroupBy> for OrderByInput {
    fn from(value: OrderByGroupBy) -> Self {
        OrderByInput::Spec(value.into())
    }
}

/// Unvalidated query parameters.
///
/// Exactly one of `saved_query` or `metrics`/`group_by` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    #[serde(default)]
    pub saved_query: Option<String>,
    #[serde(default)]
    pub metrics: Option<Vec<String>>,
    #[serde(default)]
    pub group_by: Option<Vec<GroupByInput>>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub order_by: Option<Vec<OrderByInput>>,
    #[serde(default, rename = "where")]
    pub where_filters: Option<Vec<String>>,
    #[serde(default)]
    pub read_cache: Option<bool>,
}

impl QueryParameters {
    /// Starts an ad-hoc query over the given metrics.
    pub fn adhoc<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: Some(metrics.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Starts a query running the named saved query.
    pub fn saved(name: impl Into<String>) -> Self {
        Self {
            saved_query: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_group_by<I, G>(mut self, group_by: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<GroupByInput>,
    {
        self.group_by = Some(group_by.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_order_by<I, O>(mut self, order_by: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderByInput>,
    {
        self.order_by = Some(order_by.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_where<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.where_filters = Some(filters.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_read_cache(mut self, read_cache: bool) -> Self {
        self.read_cache = Some(read_cache);
        self
    }
}

/// Options shared by both query shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub limit: Option<u64>,
    pub order_by: Vec<OrderBySpec>,
    pub where_filters: Vec<String>,
    pub read_cache: bool,
}

/// An ad-hoc query over metrics and group-bys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdhocQuery {
    pub metrics: Vec<String>,
    pub group_by: Vec<GroupByInput>,
    pub options: QueryOptions,
}

/// A run of a saved query, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedQueryRef {
    pub name: String,
    pub options: QueryOptions,
}

/// Query parameters that passed [`crate::params::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedQuery {
    Adhoc(AdhocQuery),
    Saved(SavedQueryRef),
}

impl ValidatedQuery {
    pub fn options(&self) -> &QueryOptions {
        match self {
            ValidatedQuery::Adhoc(adhoc) => &adhoc.options,
            ValidatedQuery::Saved(saved) => &saved.options,
        }
    }
}

/// Parameters of a dimension values lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValuesParameters {
    pub group_by: String,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl DimensionValuesParameters {
    pub fn new<I, S>(group_by: impl Into<String>, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_by: group_by.into(),
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }
}
