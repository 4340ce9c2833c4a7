//! Reqwest-backed embedding client for an OpenAI-style embeddings endpoint.

use super::{EmbeddingClient, EmbeddingError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// HTTP embedding client.
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    /// Construct a client for the given provider base URL, model, and expected dimension.
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            dimension,
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&json!({ "model": self.model, "input": text }));
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Embedding request failed");
            return Err(error);
        }

        let payload: EmbeddingsResponse = response
            .json()
            .await
            .map_err(EmbeddingError::Http)?;
        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or(EmbeddingError::MissingVector)?;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer, dimension: usize) -> HttpEmbeddingClient {
        HttpEmbeddingClient::new(
            Client::new(),
            &server.base_url(),
            Some("secret".into()),
            "test-embed-model",
            dimension,
        )
    }

    #[tokio::test]
    async fn embed_posts_model_and_input() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embeddings")
                    .header("authorization", "Bearer secret")
                    .json_body_partial(r#"{"model": "test-embed-model", "input": "hello"}"#);
                then.status(200)
                    .json_body(serde_json::json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]}));
            })
            .await;

        let vector = client_for(&server, 3).embed("hello").await.expect("embed");
        mock.assert();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn too_many_requests_maps_to_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(429).body("slow down");
            })
            .await;

        let error = client_for(&server, 3).embed("hello").await.unwrap_err();
        assert!(error.is_rate_limit());
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200)
                    .json_body(serde_json::json!({"data": [{"embedding": [0.1, 0.2]}]}));
            })
            .await;

        let error = client_for(&server, 3).embed("hello").await.unwrap_err();
        assert!(matches!(
            error,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }
}
