//! Pure strategy selection for the chunking router.

use crate::extract::ExtractedPayload;
use crate::store::DocumentType;
use serde_json::Value;

/// Chunking strategies available to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Entity-aware chunking for JSON data models.
    EntityJson,
    /// Structural chunking for free text with section detection.
    StructuralText,
    /// Degraded line-group splitting for JSON-shaped payloads that fail to parse.
    LineGroups,
}

/// Select a strategy from the resolved payload and the document's declared type.
///
/// Declared data models and structured payloads always take the entity-aware route; text that
/// merely looks like JSON must also parse as JSON, otherwise it degrades to line groups.
pub fn classify(payload: &ExtractedPayload, doc_type: DocumentType) -> Strategy {
    match payload {
        ExtractedPayload::Structured(_) => Strategy::EntityJson,
        ExtractedPayload::Text(text) => {
            if doc_type == DocumentType::DataModel {
                return Strategy::EntityJson;
            }
            if looks_like_json(text) {
                if serde_json::from_str::<Value>(text).is_ok() {
                    Strategy::EntityJson
                } else {
                    Strategy::LineGroups
                }
            } else {
                Strategy::StructuralText
            }
        }
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_payloads_take_the_entity_route() {
        let payload = ExtractedPayload::Structured(json!({"entities": {}}));
        assert_eq!(
            classify(&payload, DocumentType::Other),
            Strategy::EntityJson
        );
    }

    #[test]
    fn declared_data_models_take_the_entity_route_even_for_text() {
        let payload = ExtractedPayload::Text("not json at all".into());
        assert_eq!(
            classify(&payload, DocumentType::DataModel),
            Strategy::EntityJson
        );
    }

    #[test]
    fn parseable_json_text_takes_the_entity_route() {
        let payload = ExtractedPayload::Text("{\"tables\": {\"users\": {}}}".into());
        assert_eq!(
            classify(&payload, DocumentType::Other),
            Strategy::EntityJson
        );
    }

    #[test]
    fn malformed_json_text_degrades_to_line_groups() {
        let payload = ExtractedPayload::Text("{\"oops\": ".into());
        assert_eq!(
            classify(&payload, DocumentType::Other),
            Strategy::LineGroups
        );
    }

    #[test]
    fn prose_takes_the_structural_route() {
        let payload = ExtractedPayload::Text("Plain prose with no braces.".into());
        assert_eq!(
            classify(&payload, DocumentType::TechnicalDesign),
            Strategy::StructuralText
        );
    }
}
