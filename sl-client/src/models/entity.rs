use serde::{Deserialize, Serialize};

use crate::protocol::graphql::{WireField, WireModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Foreign,
    Natural,
    Primary,
    Unique,
    #[serde(other)]
    Unknown,
}

/// A join key between semantic models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
}

impl WireModel for Entity {
    const TYPE_NAME: &'static str = "Entity";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("description"),
            WireField::scalar("type"),
            WireField::scalar("role"),
            WireField::scalar("expr"),
        ]
    }
}
