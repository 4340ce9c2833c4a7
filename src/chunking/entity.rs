//! Entity-aware chunking for JSON data models.

use super::{DraftChunk, Importance, text};
use serde_json::{Map, Value};

/// Top-level keys recognized as containers of named entities.
const ENTITY_CONTAINER_KEYS: [&str; 3] = ["entities", "models", "tables"];

/// Chunk a parsed JSON data model.
///
/// When a recognizable entity container exists this emits a deterministic sequence: one schema
/// overview chunk, one chunk per entity, and one relationships chunk when a `relationships`
/// field is present, giving `1 + E + (0|1)` chunks of high importance. JSON without a
/// container is stringified and handed to the structural text chunker.
pub fn chunk_data_model(value: &Value, max_size: usize) -> Vec<DraftChunk> {
    let Some((container_key, entities)) = find_entity_container(value) else {
        tracing::debug!("No entity container found; chunking JSON generically");
        return text::chunk_sectioned_text(&pretty(value), max_size);
    };

    let names: Vec<&str> = entities.keys().map(String::as_str).collect();
    let mut chunks = Vec::with_capacity(entities.len() + 2);
    chunks.push(DraftChunk {
        text: format!(
            "Data model schema with {} entities defined under \"{container_key}\": {}.",
            names.len(),
            names.join(", ")
        ),
        section: "Schema Overview".into(),
        importance: Importance::High,
    });

    for (name, definition) in entities {
        chunks.push(DraftChunk {
            text: format!("Entity: {name}\n{}", pretty(definition)),
            section: name.clone(),
            importance: Importance::High,
        });
    }

    if let Some(relationships) = value.get("relationships") {
        chunks.push(DraftChunk {
            text: format!("Relationships\n{}", pretty(relationships)),
            section: "Relationships".into(),
            importance: Importance::High,
        });
    }

    chunks
}

fn find_entity_container(value: &Value) -> Option<(&str, &Map<String, Value>)> {
    let object = value.as_object()?;
    ENTITY_CONTAINER_KEYS.iter().find_map(|key| {
        object
            .get(*key)
            .and_then(Value::as_object)
            .filter(|entities| !entities.is_empty())
            .map(|entities| (*key, entities))
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
