//! HTTP client for the AI extraction service.

use super::ExtractError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Region descriptor for a content-extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRegion {
    /// Opening pages of the document.
    Beginning,
    /// Middle of the document.
    Middle,
    /// Closing pages of the document.
    End,
}

impl DocumentRegion {
    /// Wire and log representation of the region.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginning => "beginning",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

/// Interface to the AI extraction service for binary documents.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Survey pages, sections, tables, and code blocks, capped to a small token budget.
    async fn structure_overview(
        &self,
        document: &[u8],
        name: &str,
        max_tokens: u32,
    ) -> Result<String, ExtractError>;

    /// Extract readable text for one region of the document.
    async fn extract_region(
        &self,
        document: &[u8],
        name: &str,
        region: DocumentRegion,
        max_tokens: u32,
    ) -> Result<String, ExtractError>;
}

/// Reqwest-backed extraction client.
pub struct HttpExtractionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ExtractResponse {
    text: String,
}

impl HttpExtractionClient {
    /// Construct a client for the given service base URL.
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn call(
        &self,
        document: &[u8],
        name: &str,
        query: &[(&str, String)],
    ) -> Result<String, ExtractError> {
        let mut request = self
            .client
            .post(format!("{}/v1/extract", self.base_url))
            .query(query)
            .header("content-type", "application/octet-stream")
            .header("x-document-name", name)
            .body(document.to_vec());
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.header("api-key", api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ExtractError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Extraction request failed");
            return Err(error);
        }
        let payload: ExtractResponse = response.json().await?;
        Ok(payload.text)
    }
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn structure_overview(
        &self,
        document: &[u8],
        name: &str,
        max_tokens: u32,
    ) -> Result<String, ExtractError> {
        self.call(
            document,
            name,
            &[
                ("mode", "overview".to_string()),
                ("max_tokens", max_tokens.to_string()),
            ],
        )
        .await
    }

    async fn extract_region(
        &self,
        document: &[u8],
        name: &str,
        region: DocumentRegion,
        max_tokens: u32,
    ) -> Result<String, ExtractError> {
        self.call(
            document,
            name,
            &[
                ("mode", "content".to_string()),
                ("region", region.as_str().to_string()),
                ("max_tokens", max_tokens.to_string()),
            ],
        )
        .await
    }
}
