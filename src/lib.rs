#![deny(missing_docs)]

//! Core library for the Docpipe ingestion server.

/// HTTP routing and REST handlers.
pub mod api;
/// Content-type-aware chunking strategies.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and retry policy.
pub mod embedding;
/// Content extraction for inline and file-backed documents.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document processing pipeline orchestration.
pub mod pipeline;
/// Document and chunk storage abstraction.
pub mod store;
