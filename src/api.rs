//! HTTP surface for Docpipe.
//!
//! This module exposes a compact Axum router with two endpoints:
//!
//! - `POST /process` – Run the ingestion pipeline for one document: resolve content, chunk,
//!   embed, and persist. Returns `{success, message, documentId, totalChunks,
//!   successfulChunks}` or, when the document was already chunked, `{success, message,
//!   documentId, skipped}`.
//! - `GET /metrics` – Observe ingestion counters.
//!
//! Failures always produce a definitive `{success: false, error}` body; partial chunk
//! failures surface through `successfulChunks < totalChunks` instead.

use crate::pipeline::{DocumentProcessor, PipelineError, ProcessOutcome, ProcessRequest};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build the HTTP router exposing the processing API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentProcessor + 'static,
{
    Router::new()
        .route("/process", post(process_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Request body for the `POST /process` endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequestBody {
    /// Identifier of the document to process.
    document_id: String,
    /// Optional file URL overriding the stored reference.
    #[serde(default)]
    file_url: Option<String>,
    /// Optional file type overriding the stored reference.
    #[serde(default)]
    file_type: Option<String>,
    /// Optional project identifier overriding the stored document's project.
    #[serde(default)]
    project_id: Option<String>,
    /// Delete existing chunks and reprocess.
    #[serde(default)]
    force_reprocess: bool,
}

/// Success response for the `POST /process` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponseBody {
    success: bool,
    message: String,
    document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    successful_chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<bool>,
}

/// Run the processing pipeline for one document.
async fn process_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ProcessRequestBody>,
) -> Result<Json<ProcessResponseBody>, AppError>
where
    S: DocumentProcessor,
{
    let ProcessRequestBody {
        document_id,
        file_url,
        file_type,
        project_id,
        force_reprocess,
    } = request;

    let outcome = service
        .process(ProcessRequest {
            document_id: document_id.clone(),
            file_url,
            file_type,
            project_id,
            force_reprocess,
        })
        .await?;

    let body = match outcome {
        ProcessOutcome::Skipped => ProcessResponseBody {
            success: true,
            message: "Document already processed; skipped".into(),
            document_id,
            total_chunks: None,
            successful_chunks: None,
            skipped: Some(true),
        },
        ProcessOutcome::Completed {
            total_chunks,
            successful_chunks,
        } => ProcessResponseBody {
            success: true,
            message: format!(
                "Processed document into {successful_chunks} of {total_chunks} chunks"
            ),
            document_id,
            total_chunks: Some(total_chunks),
            successful_chunks: Some(successful_chunks),
            skipped: None,
        },
    };
    Ok(Json(body))
}

/// Return the current ingestion counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: DocumentProcessor,
{
    Json(service.metrics_snapshot())
}

/// Error body shared by every failure response.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::EmptyContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    struct StubProcessor {
        calls: Mutex<Vec<ProcessRequest>>,
        outcome: Result<ProcessOutcome, fn() -> PipelineError>,
    }

    impl StubProcessor {
        fn new(outcome: Result<ProcessOutcome, fn() -> PipelineError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            }
        }
    }

    #[async_trait]
    impl DocumentProcessor for StubProcessor {
        async fn process(
            &self,
            request: ProcessRequest,
        ) -> Result<ProcessOutcome, PipelineError> {
            self.calls.lock().await.push(request);
            self.outcome.map_err(|make| make())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_processed: 1,
                chunks_persisted: 4,
                chunks_failed: 1,
            }
        }
    }

    async fn send(
        service: Arc<StubProcessor>,
        payload: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let app = create_router(service);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/process")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn completed_run_reports_chunk_counters() {
        let service = Arc::new(StubProcessor::new(Ok(ProcessOutcome::Completed {
            total_chunks: 5,
            successful_chunks: 4,
        })));
        let (status, body) = send(
            Arc::clone(&service),
            json!({
                "documentId": "doc-7",
                "projectId": "proj-2",
                "forceReprocess": true
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["documentId"], "doc-7");
        assert_eq!(body["totalChunks"], 5);
        assert_eq!(body["successfulChunks"], 4);
        assert!(body.get("skipped").is_none());

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].force_reprocess);
        assert_eq!(calls[0].project_id.as_deref(), Some("proj-2"));
    }

    #[tokio::test]
    async fn skipped_run_sets_the_skipped_flag() {
        let service = Arc::new(StubProcessor::new(Ok(ProcessOutcome::Skipped)));
        let (status, body) = send(service, json!({"documentId": "doc-7"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skipped"], true);
        assert!(body.get("totalChunks").is_none());
    }

    #[tokio::test]
    async fn missing_document_maps_to_not_found() {
        let service = Arc::new(StubProcessor::new(Err(|| {
            PipelineError::NotFound("doc-7".into())
        })));
        let (status, body) = send(service, json!({"documentId": "doc-7"})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().expect("error string").contains("doc-7"));
    }

    #[tokio::test]
    async fn metrics_route_serializes_the_snapshot() {
        let service = Arc::new(StubProcessor::new(Ok(ProcessOutcome::Skipped)));
        let app = create_router(service);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["documents_processed"], 1);
        assert_eq!(body["chunks_persisted"], 4);
    }
}
