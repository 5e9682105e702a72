//! Volcengine Ark multimodal embedding provider.
//!
//! Calls `POST {base_url}/embeddings/multimodal`. Text and images share one
//! embedding space, so the same model serves image indexing and text queries
//! against the image collection.

use super::http::{build_client, join_url, post_json};
use crate::embeddings::{EmbeddingProvider, ImageInput};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use topicshelf_core::AppResult;
use tracing::instrument;

const EMBEDDING_ENDPOINT: &str = "/embeddings/multimodal";

/// Ark multimodal embedding provider
#[derive(Debug, Clone)]
pub struct ArkProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<InputPart>,
    encoding_format: &'static str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize, PartialEq)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: EmbeddingData,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl ArkProvider {
    pub fn new(base_url: &str, model: &str, api_key: String) -> AppResult<Self> {
        Ok(Self {
            client: build_client("Ark", None)?,
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    async fn embed_parts(&self, input: Vec<InputPart>) -> AppResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input,
            encoding_format: "float",
        };

        let url = join_url(&self.base_url, EMBEDDING_ENDPOINT);
        let response: EmbeddingResponse =
            post_json(&self.client, "Ark", &url, Some(&self.api_key), &request).await?;

        Ok(response.data.embedding)
    }
}

fn image_parts(image: &ImageInput, hint: Option<&str>) -> Vec<InputPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(text) = hint.filter(|h| !h.trim().is_empty()) {
        parts.push(InputPart::Text {
            text: text.to_string(),
        });
    }
    parts.push(InputPart::ImageUrl {
        image_url: ImageUrl {
            url: image.data_url(),
        },
    });
    parts
}

#[async_trait]
impl EmbeddingProvider for ArkProvider {
    fn provider_name(&self) -> &str {
        "ark"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_images(&self) -> bool {
        true
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ark", model = %self.model))]
    async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_parts(vec![InputPart::Text {
            text: text.to_string(),
        }])
        .await
    }

    #[instrument(skip(self, image, hint), fields(format = image.format.subtype(), provider = "ark", model = %self.model))]
    async fn embed_image(&self, image: &ImageInput, hint: Option<&str>) -> AppResult<Vec<f32>> {
        self.embed_parts(image_parts(image, hint)).await
    }
}
