//! Raw byte retrieval for file-backed documents.

use super::ExtractError;
use async_trait::async_trait;
use reqwest::Client;

/// Interface for retrieving raw file bytes by URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Download the file at `url` and return its bytes.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExtractError>;
}

/// HTTP-backed fetcher used for PDF and JSON file references.
pub struct HttpFileFetcher {
    client: Client,
}

impl HttpFileFetcher {
    /// Wrap a shared reqwest client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileFetcher for HttpFileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = ExtractError::UnexpectedStatus { status, body };
            tracing::error!(url, error = %error, "File fetch failed");
            return Err(error);
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
