//! Pipeline orchestration coordinating extraction, chunking, embedding, and persistence.

use super::types::{ChunkOutcome, PipelineError, ProcessOutcome, ProcessRequest};
use crate::chunking::{self, DraftChunk};
use crate::config::{Config, RetryConfig};
use crate::embedding::{EmbeddingClient, Sleeper, embed_with_retry};
use crate::extract::ContentExtractor;
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::store::{Chunk, ChunkMetadata, DocumentStore, ProcessingMetadata};
use async_trait::async_trait;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Coordinates the full ingestion pipeline for one document at a time.
///
/// The pipeline owns long-lived handles to the document store, extractor, and embedding
/// client so every surface reuses the same components. Construct it once near process start
/// and share it through an `Arc`.
pub struct Pipeline {
    store: Arc<dyn DocumentStore>,
    extractor: ContentExtractor,
    embedder: Arc<dyn EmbeddingClient>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryConfig,
    max_chunk_size: usize,
    embedding_model: String,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the processing pipeline used by external surfaces.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Run the pipeline for one document.
    async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl Pipeline {
    /// Build a pipeline from configuration and collaborator handles.
    pub fn new(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        extractor: ContentExtractor,
        embedder: Arc<dyn EmbeddingClient>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            extractor,
            embedder,
            sleeper,
            retry: config.retry,
            max_chunk_size: config.max_chunk_size,
            embedding_model: config.embedding_model.clone(),
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Run the pipeline for one document.
    ///
    /// The call blocks until extraction, chunking, every embedding attempt, and every chunk
    /// write complete. Per-chunk failures are reported through the outcome counters rather
    /// than as an overall failure.
    ///
    /// The idempotency check is check-then-act: two concurrent calls for the same document
    /// can both pass the gate and write duplicate chunks. Callers are expected to serialize
    /// requests per document.
    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, PipelineError> {
        let ProcessRequest {
            document_id,
            file_url,
            file_type,
            project_id,
            force_reprocess,
        } = request;
        tracing::info!(document = %document_id, force_reprocess, "Processing document");

        let mut document = self
            .store
            .fetch_document(&document_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(document_id.clone()))?;

        // Request-supplied fields win for this run; the caller knows best at upload time.
        if let Some(url) = file_url {
            document.file_url = Some(url);
        }
        if let Some(file_type) = file_type {
            document.file_type = Some(file_type);
        }
        if let Some(project) = project_id {
            document.project_id = project;
        }

        if force_reprocess {
            let removed = self.store.delete_chunks(&document_id).await?;
            tracing::info!(document = %document_id, removed, "Deleted stale chunks for reprocessing");
        } else if self.store.has_chunks(&document_id).await? {
            tracing::info!(document = %document_id, "Document already chunked; skipping");
            return Ok(ProcessOutcome::Skipped);
        }

        let resolution = self.extractor.resolve(&document).await;
        if let Some(content) = resolution.write_back {
            if let Err(error) = self.store.update_content(&document_id, content).await {
                tracing::warn!(
                    document = %document_id,
                    error = %error,
                    "Failed to persist extracted content"
                );
            }
        }
        if resolution.payload.is_blank() {
            return Err(PipelineError::EmptyContent(document_id));
        }

        let drafts =
            chunking::chunk_payload(&resolution.payload, document.doc_type, self.max_chunk_size);
        if drafts.is_empty() {
            return Err(PipelineError::EmptyContent(document_id));
        }
        let total_chunks = drafts.len();
        tracing::debug!(document = %document_id, chunks = total_chunks, "Chunking complete");

        let outcomes = self.embed_all(&drafts).await;
        let mut survivors: Vec<(usize, Vec<f32>)> = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(vector) => survivors.push((outcome.emission_index, vector)),
                Err(error) => tracing::warn!(
                    document = %document_id,
                    chunk = outcome.emission_index,
                    section = %outcome.section,
                    error = %error,
                    "Chunk failed embedding; continuing with siblings"
                ),
            }
        }

        let successful_chunks = self.persist_chunks(&document, &drafts, survivors).await;
        self.metrics.record_document(
            successful_chunks as u64,
            (total_chunks - successful_chunks) as u64,
        );

        let metadata = ProcessingMetadata {
            success_rate: successful_chunks as f32 / total_chunks as f32,
            total_chunks,
            embedding_model: self.embedding_model.clone(),
            processed_at: current_timestamp_rfc3339(),
        };
        if let Err(error) = self
            .store
            .record_processing(&document_id, successful_chunks, metadata)
            .await
        {
            // Chunk rows are already durable; the summary still reports success.
            tracing::warn!(
                document = %document_id,
                error = %error,
                "Failed to update document processing metadata"
            );
        }

        tracing::info!(
            document = %document_id,
            total = total_chunks,
            successful = successful_chunks,
            "Document processed"
        );
        Ok(ProcessOutcome::Completed {
            total_chunks,
            successful_chunks,
        })
    }

    /// Dispatch one embedding task per chunk and collect outcomes in emission order.
    async fn embed_all(&self, drafts: &[DraftChunk]) -> Vec<ChunkOutcome> {
        let mut tasks = JoinSet::new();
        for (index, draft) in drafts.iter().enumerate() {
            let embedder = Arc::clone(&self.embedder);
            let sleeper = Arc::clone(&self.sleeper);
            let retry = self.retry;
            let text = draft.text.clone();
            let section = draft.section.clone();
            tasks.spawn(async move {
                let result =
                    embed_with_retry(embedder.as_ref(), &retry, sleeper.as_ref(), &text).await;
                ChunkOutcome {
                    emission_index: index,
                    section,
                    result,
                }
            });
        }

        let mut outcomes = Vec::with_capacity(drafts.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => tracing::error!(error = %error, "Embedding task panicked"),
            }
        }
        outcomes.sort_by_key(|outcome| outcome.emission_index);
        outcomes
    }

    /// Renumber surviving chunks contiguously and fan out the row writes.
    ///
    /// Indexes are assigned after the embedding fan-in, so an embedding failure can never
    /// leave a gap in the persisted sequence.
    async fn persist_chunks(
        &self,
        document: &crate::store::Document,
        drafts: &[DraftChunk],
        survivors: Vec<(usize, Vec<f32>)>,
    ) -> usize {
        let persisted_total = survivors.len();
        let mut tasks = JoinSet::new();
        for (final_index, (emission_index, vector)) in survivors.into_iter().enumerate() {
            let draft = &drafts[emission_index];
            let chunk = Chunk {
                id: Uuid::new_v4().to_string(),
                document_id: document.id.clone(),
                project_id: document.project_id.clone(),
                doc_type: document.doc_type,
                text: draft.text.clone(),
                chunk_index: final_index,
                embedding: vector,
                metadata: ChunkMetadata {
                    document_name: document.name.clone(),
                    section: draft.section.clone(),
                    importance: draft.importance,
                    char_length: draft.text.chars().count(),
                    word_count: draft.text.split_whitespace().count(),
                    position_ratio: final_index as f32 / persisted_total as f32,
                },
            };
            let store = Arc::clone(&self.store);
            tasks.spawn(async move { store.insert_chunk(chunk).await });
        }

        let mut successful = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => successful += 1,
                Ok(Err(error)) => {
                    tracing::warn!(document = %document.id, error = %error, "Chunk insert failed");
                }
                Err(error) => tracing::error!(error = %error, "Persistence task panicked"),
            }
        }
        successful
    }
}

#[async_trait]
impl DocumentProcessor for Pipeline {
    async fn process(&self, request: ProcessRequest) -> Result<ProcessOutcome, PipelineError> {
        Pipeline::process(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Current timestamp formatted for document metadata.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
