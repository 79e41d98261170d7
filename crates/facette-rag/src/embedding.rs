//! Embedding-service client.
//!
//! Talks to an OpenAI-compatible embedding endpoint over HTTP. Services
//! differ in their response envelope, so parsing tolerates both the
//! object-with-data shape and a bare array of vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CONNECT_TIMEOUT_SECS: u64 = 5;
const ERROR_BODY_PREVIEW: usize = 256;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("embedding service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("embedding response contained no vectors")]
    EmptyResponse,
    #[error("expected {expected}-dim embedding, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Text → fixed-length vector contract of the embedding collaborator.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8082".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Object(ObjectResponse),
    Bare(Vec<Vec<f32>>),
}

/// HTTP-backed embedder with explicit connect and request timeouts.
pub struct HttpEmbedder {
    config: EmbeddingConfig,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.config.model,
        };

        let response = self
            .client
            .post(format!("{}/embedding", self.config.url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Service {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vector = match parsed {
            EmbeddingResponse::Object(object) => {
                object.data.into_iter().next().map(|d| d.embedding)
            }
            EmbeddingResponse::Bare(vectors) => vectors.into_iter().next(),
        }
        .ok_or(EmbeddingError::EmptyResponse)?;

        if vector.len() != self.config.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dimensions,
                got: vector.len(),
            });
        }

        tracing::trace!(chars = text.len(), dims = vector.len(), "embedded query text");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(server: &mockito::Server) -> EmbeddingConfig {
        EmbeddingConfig {
            url: server.url(),
            dimensions: 3,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_embed_object_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embedding")
            .with_status(200)
            .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#)
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(config_for(&server)).unwrap();
        let vector = embedder.embed("oval face makeup technique").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_bare_array_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embedding")
            .with_status(200)
            .with_body(r#"[[1.0,2.0,3.0]]"#)
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(config_for(&server)).unwrap();
        let vector = embedder.embed("query").await.unwrap();
        assert_eq!(vector, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_embed_service_error_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embedding")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(config_for(&server)).unwrap();
        let err = embedder.embed("query").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Service { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_embed_dimension_mismatch_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embedding")
            .with_status(200)
            .with_body(r#"{"data":[{"embedding":[0.1,0.2]}]}"#)
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(config_for(&server)).unwrap();
        let err = embedder.embed("query").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { expected: 3, got: 2 }
        ));
    }

    #[tokio::test]
    async fn test_embed_empty_response_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embedding")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(config_for(&server)).unwrap();
        let err = embedder.embed("query").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyResponse));
    }
}
