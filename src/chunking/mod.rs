//! Content-type-aware chunking strategies.
//!
//! Chunking is driven by a pure classification step ([`classify::classify`]) that maps a
//! resolved payload and the document's declared type onto one of three strategies:
//!
//! - [`entity::chunk_data_model`]: entity-aware chunking for JSON data models.
//! - [`text::chunk_sectioned_text`]: structural chunking for free text, with section
//!   detection, code-block-preserving splitting, and a paragraph fallback.
//! - [`fallback::chunk_line_groups`]: degraded line-group splitting, used only when a
//!   JSON-shaped payload fails to parse.
//!
//! Every strategy respects one shared character budget and emits [`DraftChunk`] records in
//! reading order; the pipeline assigns indexes and position ratios after embedding.

pub mod classify;
pub mod entity;
pub mod fallback;
pub mod text;

pub use classify::{Strategy, classify};

use crate::extract::ExtractedPayload;
use crate::store::DocumentType;
use serde::{Deserialize, Serialize};

/// Heuristic retrieval importance attached to each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Sections retrieval should strongly prefer.
    High,
    /// Context-setting sections.
    Medium,
    /// Everything else.
    Standard,
}

impl Importance {
    /// Stable string form used in chunk payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Standard => "standard",
        }
    }
}

/// An ordered chunk produced by a strategy, before indexes and embeddings are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftChunk {
    /// Chunk text.
    pub text: String,
    /// Section label, detected or synthesized.
    pub section: String,
    /// Heuristic importance derived from the section title.
    pub importance: Importance,
}

/// Section titles containing any of these rank as [`Importance::High`].
pub const HIGH_IMPORTANCE_KEYWORDS: [&str; 8] = [
    "requirement",
    "introduction",
    "overview",
    "scope",
    "objective",
    "feature",
    "functional",
    "architecture",
];

/// Section titles containing any of these (and no high keyword) rank as [`Importance::Medium`].
pub const MEDIUM_IMPORTANCE_KEYWORDS: [&str; 4] =
    ["background", "summary", "conclusion", "design"];

/// Classify a section title by case-insensitive keyword membership.
pub fn classify_importance(title: &str) -> Importance {
    let lowered = title.to_lowercase();
    if HIGH_IMPORTANCE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        Importance::High
    } else if MEDIUM_IMPORTANCE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        Importance::Medium
    } else {
        Importance::Standard
    }
}

/// Route a resolved payload through the strategy selected by [`classify`].
///
/// Blank chunks are filtered here so every caller sees only embeddable output.
pub fn chunk_payload(
    payload: &ExtractedPayload,
    doc_type: DocumentType,
    max_size: usize,
) -> Vec<DraftChunk> {
    let strategy = classify(payload, doc_type);
    tracing::debug!(strategy = ?strategy, doc_type = doc_type.as_str(), "Selected chunking strategy");
    let chunks = match strategy {
        Strategy::EntityJson => match payload.to_json() {
            Some(value) => entity::chunk_data_model(&value, max_size),
            None => fallback::chunk_line_groups(&payload.flattened_text(), max_size),
        },
        Strategy::StructuralText => text::chunk_sectioned_text(&payload.flattened_text(), max_size),
        Strategy::LineGroups => fallback::chunk_line_groups(&payload.flattened_text(), max_size),
    };
    chunks
        .into_iter()
        .filter(|chunk| !chunk.text.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_prefers_high_over_medium() {
        // "design overview" matches both lists; high wins.
        assert_eq!(classify_importance("Design Overview"), Importance::High);
        assert_eq!(classify_importance("2. Background"), Importance::Medium);
        assert_eq!(classify_importance("Glossary"), Importance::Standard);
    }

    #[test]
    fn importance_matching_is_case_insensitive() {
        assert_eq!(classify_importance("REQUIREMENTS"), Importance::High);
        assert_eq!(classify_importance("conclusion"), Importance::Medium);
    }

    #[test]
    fn chunk_payload_routes_plain_text_to_sections() {
        let payload = ExtractedPayload::Text(format!(
            "1. Introduction\n{}\n2. Requirements\n{}",
            "The system ingests heterogeneous documents for retrieval purposes.",
            "Chunks must stay under the configured size budget at all times."
        ));
        let chunks = chunk_payload(&payload, DocumentType::Other, 1500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].section, "Document Overview");
    }
}
