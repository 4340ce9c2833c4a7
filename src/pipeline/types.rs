//! Request, outcome, and error types for the processing pipeline.

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use thiserror::Error;

/// Parameters for one processing run.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    /// Identifier of the document to process.
    pub document_id: String,
    /// Optional file URL overriding the stored document's reference for this run.
    pub file_url: Option<String>,
    /// Optional file type overriding the stored document's reference for this run.
    pub file_type: Option<String>,
    /// Optional project identifier overriding the stored document's project for this run.
    pub project_id: Option<String>,
    /// Delete existing chunks and reprocess even when the document was already chunked.
    pub force_reprocess: bool,
}

/// Summary of a completed processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The document already had chunks and `force_reprocess` was not set.
    Skipped,
    /// The pipeline ran to completion; individual chunks may still have failed.
    Completed {
        /// Number of chunks the run attempted.
        total_chunks: usize,
        /// Number of chunks embedded and persisted.
        successful_chunks: usize,
    },
}

/// Per-chunk embedding outcome collected at the fan-in point.
///
/// Partial-failure accounting is an explicit data structure: the caller inspects one record
/// per emitted chunk instead of relying on scattered error handling inside the fan-out.
#[derive(Debug)]
pub struct ChunkOutcome {
    /// Index of the chunk in emission order.
    pub emission_index: usize,
    /// Section label, carried for log context.
    pub section: String,
    /// The embedding vector, or the error that exhausted its retries.
    pub result: Result<Vec<f32>, EmbeddingError>,
}

/// Fatal errors aborting a processing run.
///
/// Extraction and per-chunk failures are deliberately absent: extraction degrades to a
/// placeholder payload and chunk failures surface through the outcome counters.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document id did not resolve.
    #[error("Document {0} not found")]
    NotFound(String),
    /// The resolved payload was blank; there is nothing to chunk.
    #[error("Document {0} has no content to process")]
    EmptyContent(String),
    /// The document store failed outside the per-chunk write path.
    #[error("Store request failed: {0}")]
    Store(#[from] StoreError),
}
