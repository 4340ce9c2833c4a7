//! Document and chunk storage abstraction.
//!
//! The document store is owned by the wider application; this pipeline only consumes the
//! narrow interface below. [`memory::InMemoryStore`] provides a reference implementation used
//! by the standalone binary and the test suite.

pub mod memory;
pub mod types;

pub use memory::InMemoryStore;
pub use types::{
    Chunk, ChunkMetadata, Document, DocumentContent, DocumentType, ProcessingMetadata, StoreError,
};

use async_trait::async_trait;

/// Interface to the externally owned document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document by id, returning `None` when the id does not resolve.
    async fn fetch_document(&self, id: &str) -> Result<Option<Document>, StoreError>;

    /// Replace the document's inline content (extraction write-back).
    async fn update_content(&self, id: &str, content: DocumentContent) -> Result<(), StoreError>;

    /// Whether at least one chunk exists for the document.
    async fn has_chunks(&self, document_id: &str) -> Result<bool, StoreError>;

    /// Delete all chunks belonging to the document, returning the number removed.
    async fn delete_chunks(&self, document_id: &str) -> Result<usize, StoreError>;

    /// Insert one chunk row.
    async fn insert_chunk(&self, chunk: Chunk) -> Result<(), StoreError>;

    /// Record the outcome of a processing run on the parent document.
    async fn record_processing(
        &self,
        id: &str,
        chunk_count: usize,
        metadata: ProcessingMetadata,
    ) -> Result<(), StoreError>;
}
