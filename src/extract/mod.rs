//! Content extraction for inline and file-backed documents.
//!
//! Extraction resolves a document's stored content into one classified payload. Inline
//! content is classified directly; binary file references go through a two-phase AI
//! extraction (structure overview, then beginning/middle/end content passes); JSON file
//! references are fetched and parsed. Extraction failures degrade to a labeled placeholder
//! payload rather than aborting the run; rejecting a blank payload is the caller's job.

pub mod client;
pub mod fetch;

pub use client::{DocumentRegion, ExtractionClient, HttpExtractionClient};
pub use fetch::{FileFetcher, HttpFileFetcher};

use crate::store::{Document, DocumentContent};
use reqwest::StatusCode;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while fetching or extracting document content.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A collaborator responded with an unexpected status code.
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the collaborator.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Fetched bytes could not be parsed as JSON.
    #[error("Failed to parse fetched JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The extraction service returned nothing usable for any region.
    #[error("Extraction produced no usable text")]
    NoUsableText,
}

/// A document's content resolved to a closed set of classified shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedPayload {
    /// Free text, either inline or extracted from a binary file.
    Text(String),
    /// Structured JSON content.
    Structured(Value),
}

impl ExtractedPayload {
    /// Whether the payload carries nothing worth chunking.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Structured(value) => value.is_null(),
        }
    }

    /// Text view of the payload; structured values are stringified with stable formatting.
    pub fn flattened_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(value) => Cow::Owned(
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ),
        }
    }

    /// Parsed JSON view of the payload, when one exists.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Structured(value) => Some(value.clone()),
            Self::Text(text) => serde_json::from_str(text).ok(),
        }
    }
}

/// Result of resolving a document's content.
#[derive(Debug)]
pub struct Resolution {
    /// The classified payload handed to the chunking router.
    pub payload: ExtractedPayload,
    /// Content to write back onto the document so later runs skip re-extraction.
    pub write_back: Option<DocumentContent>,
}

/// Resolves documents into classified payloads, reaching out to collaborators as needed.
pub struct ContentExtractor {
    fetcher: Arc<dyn FileFetcher>,
    client: Arc<dyn ExtractionClient>,
    overview_tokens: u32,
    segment_tokens: u32,
}

impl ContentExtractor {
    /// Build an extractor over the given collaborators and token budgets.
    pub fn new(
        fetcher: Arc<dyn FileFetcher>,
        client: Arc<dyn ExtractionClient>,
        overview_tokens: u32,
        segment_tokens: u32,
    ) -> Self {
        Self {
            fetcher,
            client,
            overview_tokens,
            segment_tokens,
        }
    }

    /// Resolve a document into a classified payload.
    ///
    /// Never fails: extraction errors degrade to a placeholder payload with a warning, since a
    /// low-value chunk beats losing the document entirely.
    pub async fn resolve(&self, document: &Document) -> Resolution {
        match &document.content {
            DocumentContent::Text(text) if !text.trim().is_empty() => Resolution {
                payload: ExtractedPayload::Text(text.clone()),
                write_back: None,
            },
            DocumentContent::Structured(value) => Resolution {
                payload: classify_structured(document, value),
                write_back: None,
            },
            _ => self.resolve_file(document).await,
        }
    }

    async fn resolve_file(&self, document: &Document) -> Resolution {
        let Some(url) = document.file_url.as_deref() else {
            return placeholder_resolution(document);
        };

        if is_binary_document(document.file_type.as_deref(), url) {
            match self.extract_binary(url, document).await {
                Ok(text) => Resolution {
                    write_back: Some(DocumentContent::Text(text.clone())),
                    payload: ExtractedPayload::Text(text),
                },
                Err(error) => {
                    tracing::warn!(
                        document = %document.id,
                        url,
                        error = %error,
                        "Binary extraction failed; degrading to placeholder"
                    );
                    placeholder_resolution(document)
                }
            }
        } else if is_json_file(document.file_type.as_deref(), url) {
            match self.fetch_json(url).await {
                Ok(value) => Resolution {
                    write_back: Some(DocumentContent::Structured(value.clone())),
                    payload: ExtractedPayload::Structured(value),
                },
                Err(error) => {
                    tracing::warn!(
                        document = %document.id,
                        url,
                        error = %error,
                        "JSON fetch failed; degrading to placeholder"
                    );
                    placeholder_resolution(document)
                }
            }
        } else {
            placeholder_resolution(document)
        }
    }

    /// Two-phase extraction: a capped structure overview, then three content passes covering
    /// the beginning, middle, and end of the document.
    async fn extract_binary(&self, url: &str, document: &Document) -> Result<String, ExtractError> {
        let bytes = self.fetcher.fetch(url).await?;
        tracing::debug!(document = %document.id, bytes = bytes.len(), "Fetched binary document");

        let overview = self
            .client
            .structure_overview(&bytes, &document.name, self.overview_tokens)
            .await?;

        let mut segments = Vec::with_capacity(3);
        for region in [
            DocumentRegion::Beginning,
            DocumentRegion::Middle,
            DocumentRegion::End,
        ] {
            match self
                .client
                .extract_region(&bytes, &document.name, region, self.segment_tokens)
                .await
            {
                Ok(text) if !text.trim().is_empty() => segments.push(text),
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(
                        document = %document.id,
                        region = region.as_str(),
                        error = %error,
                        "Region extraction failed"
                    );
                }
            }
        }

        if segments.is_empty() {
            return Err(ExtractError::NoUsableText);
        }

        let mut combined = overview;
        for segment in segments {
            combined.push_str("\n\n");
            combined.push_str(&segment);
        }
        Ok(combined)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, ExtractError> {
        let bytes = self.fetcher.fetch(url).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn classify_structured(document: &Document, value: &Value) -> ExtractedPayload {
    if value.is_object() || value.is_array() {
        return ExtractedPayload::Structured(value.clone());
    }
    // Scalars in a structured column are a data-entry quirk; keep them as text.
    tracing::warn!(document = %document.id, "Coercing non-object structured content to text");
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    ExtractedPayload::Text(text)
}

fn is_binary_document(file_type: Option<&str>, url: &str) -> bool {
    let declared_pdf = file_type
        .map(|value| value.to_lowercase().contains("pdf"))
        .unwrap_or(false);
    declared_pdf || url.to_lowercase().ends_with(".pdf")
}

fn is_json_file(file_type: Option<&str>, url: &str) -> bool {
    let declared_json = file_type
        .map(|value| value.to_lowercase().contains("json"))
        .unwrap_or(false);
    declared_json || url.to_lowercase().ends_with(".json")
}

fn placeholder_resolution(document: &Document) -> Resolution {
    let reference = document
        .file_url
        .as_deref()
        .map(|url| format!(" (file: {url})"))
        .unwrap_or_default();
    Resolution {
        payload: ExtractedPayload::Text(format!(
            "Document '{}' of type {} could not be processed for content extraction{reference}.",
            document.name,
            document.doc_type.as_str()
        )),
        write_back: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentType;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubFetcher(Result<Vec<u8>, ()>);

    #[async_trait]
    impl FileFetcher for StubFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ExtractError> {
            self.0.clone().map_err(|_| ExtractError::NoUsableText)
        }
    }

    struct StubExtraction {
        overview: Result<String, ()>,
        region: Result<String, ()>,
    }

    #[async_trait]
    impl ExtractionClient for StubExtraction {
        async fn structure_overview(
            &self,
            _document: &[u8],
            _name: &str,
            _max_tokens: u32,
        ) -> Result<String, ExtractError> {
            self.overview.clone().map_err(|_| ExtractError::NoUsableText)
        }

        async fn extract_region(
            &self,
            _document: &[u8],
            _name: &str,
            region: DocumentRegion,
            _max_tokens: u32,
        ) -> Result<String, ExtractError> {
            self.region
                .clone()
                .map(|text| format!("{} [{}]", text, region.as_str()))
                .map_err(|_| ExtractError::NoUsableText)
        }
    }

    fn extractor(fetcher: StubFetcher, client: StubExtraction) -> ContentExtractor {
        ContentExtractor::new(Arc::new(fetcher), Arc::new(client), 800, 1500)
    }

    fn document(content: DocumentContent, file_url: Option<&str>, file_type: Option<&str>) -> Document {
        Document {
            id: "doc-1".into(),
            project_id: "proj-1".into(),
            name: "Design Notes".into(),
            doc_type: DocumentType::TechnicalDesign,
            content,
            file_url: file_url.map(str::to_string),
            file_type: file_type.map(str::to_string),
            processed_at: None,
            chunk_count: None,
            processing: None,
        }
    }

    #[tokio::test]
    async fn inline_text_passes_through_unchanged() {
        let extractor = extractor(
            StubFetcher(Err(())),
            StubExtraction {
                overview: Err(()),
                region: Err(()),
            },
        );
        let doc = document(DocumentContent::Text("hello world".into()), None, None);
        let resolution = extractor.resolve(&doc).await;
        assert_eq!(resolution.payload, ExtractedPayload::Text("hello world".into()));
        assert!(resolution.write_back.is_none());
    }

    #[tokio::test]
    async fn scalar_structured_content_is_coerced_to_text() {
        let extractor = extractor(
            StubFetcher(Err(())),
            StubExtraction {
                overview: Err(()),
                region: Err(()),
            },
        );
        let doc = document(
            DocumentContent::Structured(json!("just a string")),
            None,
            None,
        );
        let resolution = extractor.resolve(&doc).await;
        assert_eq!(
            resolution.payload,
            ExtractedPayload::Text("just a string".into())
        );
    }

    #[tokio::test]
    async fn binary_extraction_concatenates_overview_and_regions() {
        let extractor = extractor(
            StubFetcher(Ok(b"%PDF-1.7".to_vec())),
            StubExtraction {
                overview: Ok("Overview: 3 sections".into()),
                region: Ok("Extracted".into()),
            },
        );
        let doc = document(DocumentContent::Missing, Some("https://files/doc.pdf"), Some("application/pdf"));
        let resolution = extractor.resolve(&doc).await;

        let ExtractedPayload::Text(text) = &resolution.payload else {
            panic!("expected text payload");
        };
        assert!(text.starts_with("Overview: 3 sections"));
        assert!(text.contains("[beginning]"));
        assert!(text.contains("[end]"));
        assert!(matches!(
            resolution.write_back,
            Some(DocumentContent::Text(_))
        ));
    }

    #[tokio::test]
    async fn failed_extraction_degrades_to_placeholder() {
        let extractor = extractor(
            StubFetcher(Ok(b"%PDF-1.7".to_vec())),
            StubExtraction {
                overview: Err(()),
                region: Err(()),
            },
        );
        let doc = document(DocumentContent::Missing, Some("https://files/doc.pdf"), Some("application/pdf"));
        let resolution = extractor.resolve(&doc).await;

        let ExtractedPayload::Text(text) = &resolution.payload else {
            panic!("expected text payload");
        };
        assert!(text.contains("Design Notes"));
        assert!(text.contains("technical-design"));
        assert!(text.contains("https://files/doc.pdf"));
        assert!(resolution.write_back.is_none());
    }

    #[tokio::test]
    async fn json_file_reference_is_fetched_and_parsed() {
        let extractor = extractor(
            StubFetcher(Ok(br#"{"entities": {"User": {}}}"#.to_vec())),
            StubExtraction {
                overview: Err(()),
                region: Err(()),
            },
        );
        let doc = document(DocumentContent::Missing, Some("https://files/model.json"), Some("application/json"));
        let resolution = extractor.resolve(&doc).await;

        assert!(matches!(
            resolution.payload,
            ExtractedPayload::Structured(_)
        ));
        assert!(matches!(
            resolution.write_back,
            Some(DocumentContent::Structured(_))
        ));
    }

    #[tokio::test]
    async fn missing_everything_yields_a_named_placeholder() {
        let extractor = extractor(
            StubFetcher(Err(())),
            StubExtraction {
                overview: Err(()),
                region: Err(()),
            },
        );
        let doc = document(DocumentContent::Missing, None, None);
        let resolution = extractor.resolve(&doc).await;
        let ExtractedPayload::Text(text) = &resolution.payload else {
            panic!("expected text payload");
        };
        assert!(text.contains("Design Notes"));
    }
}
