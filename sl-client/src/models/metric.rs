use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SlResult;
use crate::models::{Dimension, Entity, Measure, TimeGranularity};
use crate::protocol::graphql::{WireField, WireModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    Simple,
    Ratio,
    Cumulative,
    Derived,
    Conversion,
    #[serde(other)]
    Unknown,
}

/// Source of the metadata a lazily loaded [`Metric`] defers.
///
/// Implemented by the clients so that a metric fetched without its nested objects can complete
/// itself later.
pub trait MetadataLookup {
    fn dimensions(&self, metrics: &[String]) -> impl Future<Output = SlResult<Vec<Dimension>>> + Send;

    fn measures(&self, metrics: &[String]) -> impl Future<Output = SlResult<Vec<Measure>>> + Send;

    fn entities(&self, metrics: &[String]) -> impl Future<Output = SlResult<Vec<Entity>>> + Send;
}

/// A metric defined in the semantic layer.
///
/// `dimensions`, `measures` and `entities` are `None` when the metric was listed in lazy mode.
/// Use the `load_*` methods to fetch them on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub requires_metric_time: bool,
    #[serde(default)]
    pub queryable_granularities: Vec<TimeGranularity>,
    #[serde(default)]
    pub queryable_time_granularities: Vec<String>,
    #[serde(default)]
    pub dimensions: Option<Vec<Dimension>>,
    #[serde(default)]
    pub measures: Option<Vec<Measure>>,
    #[serde(default)]
    pub entities: Option<Vec<Entity>>,
}

impl Metric {
    /// Returns the dimensions of this metric, fetching them through `lookup` if absent.
    pub async fn load_dimensions<L>(&mut self, lookup: &L) -> SlResult<&[Dimension]>
    where
        L: MetadataLookup,
    {
        if self.dimensions.is_none() {
            let dimensions = lookup.dimensions(&[self.name.clone()]).await?;
            self.dimensions = Some(dimensions);
        }

        Ok(self.dimensions.as_deref().unwrap_or_default())
    }

    /// Returns the measures of this metric, fetching them through `lookup` if absent.
    pub async fn load_measures<L>(&mut self, lookup: &L) -> SlResult<&[Measure]>
    where
        L: MetadataLookup,
    {
        if self.measures.is_none() {
            let measures = lookup.measures(&[self.name.clone()]).await?;
            self.measures = Some(measures);
        }

        Ok(self.measures.as_deref().unwrap_or_default())
    }

    /// Returns the entities of this metric, fetching them through `lookup` if absent.
    pub async fn load_entities<L>(&mut self, lookup: &L) -> SlResult<&[Entity]>
    where
        L: MetadataLookup,
    {
        if self.entities.is_none() {
            let entities = lookup.entities(&[self.name.clone()]).await?;
            self.entities = Some(entities);
        }

        Ok(self.entities.as_deref().unwrap_or_default())
    }
}

impl WireModel for Metric {
    const TYPE_NAME: &'static str = "Metric";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("description"),
            WireField::scalar("type"),
            WireField::scalar("label"),
            WireField::scalar("requiresMetricTime"),
            WireField::scalar("queryableGranularities"),
            WireField::scalar("queryableTimeGranularities"),
            WireField::deferred::<Dimension>("dimensions"),
            WireField::deferred::<Measure>("measures"),
            WireField::deferred::<Entity>("entities"),
        ]
    }
}
