//! OpenAI-compatible embedding provider.
//!
//! Calls `POST {base_url}/embeddings` with a bearer token. Works with any
//! service exposing the same wire format. Text only.

use super::http::{build_client, join_url, post_json};
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use topicshelf_core::{AppError, AppResult};
use tracing::{debug, instrument};

const EMBEDDING_ENDPOINT: &str = "/embeddings";

/// OpenAI embedding provider
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, model: &str, api_key: String) -> AppResult<Self> {
        Ok(Self {
            client: build_client("OpenAI", None)?,
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "openai", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let url = join_url(&self.base_url, EMBEDDING_ENDPOINT);
        let mut response: EmbeddingResponse =
            post_json(&self.client, "OpenAI", &url, Some(&self.api_key), &request).await?;

        if response.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        debug!("Received {} embeddings", response.data.len());

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_embed_batch_orders_by_index() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/embeddings")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["first", "second"],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "data": [
                        {"index": 1, "embedding": [0.0, 1.0]},
                        {"index": 0, "embedding": [1.0, 0.0]},
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let provider =
            OpenAiProvider::new(&server.url(), "text-embedding-3-small", "sk-test".to_string())
                .unwrap();

        let embeddings = provider
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_api_error_is_propagated() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let provider =
            OpenAiProvider::new(&server.url(), "text-embedding-3-small", "bad".to_string())
                .unwrap();

        let err = provider.embed_text("hello").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(err.to_string().contains("Incorrect API key provided"));
    }
}
