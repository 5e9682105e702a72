//! Embedding provider trait and factory.

use crate::embeddings::image::ImageInput;
use crate::embeddings::providers::{ArkProvider, MockProvider, OllamaProvider, OpenAiProvider};
use std::sync::Arc;
use topicshelf_core::config::ProviderConfig;
use topicshelf_core::{AppError, AppResult};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ark")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Whether `embed_image` is implemented.
    fn supports_images(&self) -> bool {
        false
    }

    /// Generate an embedding for a single text.
    async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_text(text).await?);
        }
        Ok(embeddings)
    }

    /// Generate an embedding for an image, optionally conditioned on a text hint.
    async fn embed_image(&self, _image: &ImageInput, _hint: Option<&str>) -> AppResult<Vec<f32>> {
        Err(AppError::Embedding(format!(
            "Provider '{}' does not support image embeddings",
            self.provider_name()
        )))
    }
}

/// Create an embedding provider based on configuration.
///
/// `api_key` is required for the hosted services (`openai`, `ark`).
pub fn create_provider(
    config: &ProviderConfig,
    api_key: Option<String>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let require_key = |key: Option<String>| {
        key.ok_or_else(|| {
            AppError::Config(format!(
                "Embedding service '{}' requires an API key",
                config.service()
            ))
        })
    };

    match config {
        ProviderConfig::OpenAi {
            base_url, model, ..
        } => Ok(Arc::new(OpenAiProvider::new(
            base_url,
            model,
            require_key(api_key)?,
        )?)),

        ProviderConfig::Ark {
            base_url, model, ..
        } => Ok(Arc::new(ArkProvider::new(
            base_url,
            model,
            require_key(api_key)?,
        )?)),

        ProviderConfig::Ollama {
            endpoint,
            model,
            timeout,
        } => Ok(Arc::new(OllamaProvider::new(endpoint, model, *timeout)?)),

        ProviderConfig::Mock { dimensions } => Ok(Arc::new(MockProvider::new(*dimensions))),
    }
}
