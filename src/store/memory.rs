//! In-memory reference implementation of [`DocumentStore`].

use super::DocumentStore;
use super::types::{Chunk, Document, DocumentContent, ProcessingMetadata, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Hash-map-backed store suitable for tests and standalone runs.
///
/// Chunk rows are held in insertion order; `chunks_for` exposes them to assertions without
/// widening the [`DocumentStore`] trait.
#[derive(Default)]
pub struct InMemoryStore {
    documents: Mutex<HashMap<String, Document>>,
    chunks: Mutex<Vec<Chunk>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, replacing any previous record with the same id.
    pub async fn put_document(&self, document: Document) {
        self.documents
            .lock()
            .await
            .insert(document.id.clone(), document);
    }

    /// Return a copy of all chunks belonging to the document, sorted by chunk index.
    pub async fn chunks_for(&self, document_id: &str) -> Vec<Chunk> {
        let mut rows: Vec<Chunk> = self
            .chunks
            .lock()
            .await
            .iter()
            .filter(|chunk| chunk.document_id == document_id)
            .cloned()
            .collect();
        rows.sort_by_key(|chunk| chunk.chunk_index);
        rows
    }

    /// Return a copy of the stored document, if present.
    pub async fn document(&self, id: &str) -> Option<Document> {
        self.documents.lock().await.get(id).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn fetch_document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.lock().await.get(id).cloned())
    }

    async fn update_content(&self, id: &str, content: DocumentContent) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::DocumentMissing(id.to_string()))?;
        document.content = content;
        Ok(())
    }

    async fn has_chunks(&self, document_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .chunks
            .lock()
            .await
            .iter()
            .any(|chunk| chunk.document_id == document_id))
    }

    async fn delete_chunks(&self, document_id: &str) -> Result<usize, StoreError> {
        let mut chunks = self.chunks.lock().await;
        let before = chunks.len();
        chunks.retain(|chunk| chunk.document_id != document_id);
        Ok(before - chunks.len())
    }

    async fn insert_chunk(&self, chunk: Chunk) -> Result<(), StoreError> {
        self.chunks.lock().await.push(chunk);
        Ok(())
    }

    async fn record_processing(
        &self,
        id: &str,
        chunk_count: usize,
        metadata: ProcessingMetadata,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        let document = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::DocumentMissing(id.to_string()))?;
        document.processed_at = Some(metadata.processed_at.clone());
        document.chunk_count = Some(chunk_count);
        document.processing = Some(metadata);
        Ok(())
    }
}
