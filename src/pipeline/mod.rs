//! Document processing pipeline: idempotency gate, extraction, chunking, embedding fan-out,
//! and persistence.

pub mod service;
pub mod types;

pub use service::{DocumentProcessor, Pipeline};
pub use types::{ChunkOutcome, PipelineError, ProcessOutcome, ProcessRequest};
