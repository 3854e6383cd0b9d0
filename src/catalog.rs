//! Maps the backend's model catalog onto the public `/v1/models` shape.

use serde::Serialize;
use serde_json::Value;

/// Catalog sections that list models addressable through the gateway.
const CATALOG_SECTIONS: [&str; 3] = ["models", "team_models", "image_generators"];
const OWNER: &str = "nele";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelObject {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub owned_by: &'static str,
}

impl ModelObject {
    pub fn new(id: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            object: "model",
            created,
            owned_by: OWNER,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelObject>,
}

fn catalog_ids(catalog: &Value) -> impl Iterator<Item = &str> {
    CATALOG_SECTIONS
        .iter()
        .filter_map(|section| catalog.get(*section).and_then(Value::as_array))
        .flatten()
        .filter_map(|entry| entry.get("id").and_then(Value::as_str))
        .filter(|id| !id.trim().is_empty())
}

pub fn list_models(catalog: &Value, created: i64) -> ModelList {
    ModelList {
        object: "list",
        data: catalog_ids(catalog)
            .map(|id| ModelObject::new(id, created))
            .collect(),
    }
}

/// Case-insensitive lookup; the returned object carries the id as requested.
pub fn find_model(catalog: &Value, id: &str, created: i64) -> Option<ModelObject> {
    catalog_ids(catalog)
        .any(|candidate| candidate.eq_ignore_ascii_case(id))
        .then(|| ModelObject::new(id, created))
}
