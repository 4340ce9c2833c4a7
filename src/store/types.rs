//! Domain records shared by the store trait and the pipeline.

use crate::chunking::Importance;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors returned by document-store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a document the backend does not know about.
    #[error("Document {0} does not exist")]
    DocumentMissing(String),
    /// The backend could not complete the request.
    #[error("Store request failed: {0}")]
    Unavailable(String),
}

/// Closed set of declared document types recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    /// JSON data model describing entities and relationships.
    DataModel,
    /// System requirements specification.
    SystemRequirements,
    /// Coding guidelines and conventions.
    CodingGuidelines,
    /// Technical design document.
    TechnicalDesign,
    /// Anything else.
    #[default]
    Other,
}

impl DocumentType {
    /// Stable string form used in chunk payloads and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataModel => "data-model",
            Self::SystemRequirements => "system-requirements",
            Self::CodingGuidelines => "coding-guidelines",
            Self::TechnicalDesign => "technical-design",
            Self::Other => "other",
        }
    }
}

/// Authoritative content of a document, resolved to a closed set of shapes.
///
/// External collaborators historically stored "maybe a string, maybe JSON, maybe nothing" in a
/// single untyped column; every stage downstream of extraction pattern-matches on this enum
/// instead of re-checking shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    /// Plain text content.
    Text(String),
    /// Structured JSON content.
    Structured(Value),
    /// No inline content is stored; a file reference may exist instead.
    Missing,
}

impl DocumentContent {
    /// Whether any usable inline content is present.
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Structured(_) => false,
        }
    }
}

/// A project document as read from the external store.
///
/// The pipeline treats everything except `content`, `processed_at`, `chunk_count`, and
/// `processing` as read-only.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique identifier.
    pub id: String,
    /// Owning project identifier.
    pub project_id: String,
    /// Display name, denormalized onto each chunk.
    pub name: String,
    /// Declared document type.
    pub doc_type: DocumentType,
    /// Inline content, if any.
    pub content: DocumentContent,
    /// Optional URL of externally stored file bytes.
    pub file_url: Option<String>,
    /// Declared MIME type or extension of the referenced file.
    pub file_type: Option<String>,
    /// RFC3339 timestamp of the last successful processing run.
    pub processed_at: Option<String>,
    /// Number of chunks persisted by the last run.
    pub chunk_count: Option<usize>,
    /// Processing bookkeeping written by the pipeline.
    pub processing: Option<ProcessingMetadata>,
}

/// Bookkeeping recorded on the document after a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Fraction of attempted chunks that were embedded and persisted.
    pub success_rate: f32,
    /// Number of chunks the run attempted.
    pub total_chunks: usize,
    /// Embedding model identifier used for the run.
    pub embedding_model: String,
    /// RFC3339 timestamp of the run.
    pub processed_at: String,
}

/// A persisted chunk row, fully owned by the pipeline.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Generated identifier.
    pub id: String,
    /// Parent document identifier.
    pub document_id: String,
    /// Parent project identifier.
    pub project_id: String,
    /// Copy of the parent document's declared type.
    pub doc_type: DocumentType,
    /// Chunk text.
    pub text: String,
    /// 0-based, contiguous index in emission order.
    pub chunk_index: usize,
    /// Fixed-length embedding vector.
    pub embedding: Vec<f32>,
    /// Retrieval metadata.
    pub metadata: ChunkMetadata,
}

/// Retrieval metadata stored alongside each chunk.
#[derive(Debug, Clone)]
pub struct ChunkMetadata {
    /// Parent document name, denormalized for display.
    pub document_name: String,
    /// Section label, detected or synthesized.
    pub section: String,
    /// Heuristic retrieval importance.
    pub importance: Importance,
    /// Character length of the chunk text.
    pub char_length: usize,
    /// Whitespace-delimited word count of the chunk text.
    pub word_count: usize,
    /// Chunk index divided by the document's total chunk count.
    pub position_ratio: f32,
}
