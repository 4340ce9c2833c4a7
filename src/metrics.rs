use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_processed: AtomicU64,
    chunks_persisted: AtomicU64,
    chunks_failed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document with its persisted and failed chunk counts.
    pub fn record_document(&self, persisted: u64, failed: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.chunks_persisted.fetch_add(persisted, Ordering::Relaxed);
        self.chunks_failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            chunks_persisted: self.chunks_persisted.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents fully processed since startup.
    pub documents_processed: u64,
    /// Total chunk count persisted across all processed documents.
    pub chunks_persisted: u64,
    /// Total chunk count that failed embedding or persistence.
    pub chunks_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = IngestMetrics::new();
        metrics.record_document(2, 1);
        metrics.record_document(3, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_processed, 2);
        assert_eq!(snapshot.chunks_persisted, 5);
        assert_eq!(snapshot.chunks_failed, 1);
    }

    #[test]
    fn snapshot_starts_at_zero() {
        let metrics = IngestMetrics::new();
        assert_eq!(metrics.snapshot().documents_processed, 0);
        assert_eq!(metrics.snapshot().chunks_persisted, 0);
    }
}
