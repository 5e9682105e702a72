//! Mock embedding provider using trigram-based content-aware embeddings.

use crate::embeddings::{EmbeddingProvider, ImageInput};
use std::collections::{HashMap, HashSet};
use topicshelf_core::AppResult;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Offline provider for tests and development.
///
/// Generates deterministic embeddings: text from word and character trigram
/// hashes, images from hashed windows of their base64 payload. Vectors are
/// unit length unless the input is empty.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    /// Create a new mock provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn text_vector(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

        let lower = text.to_lowercase();
        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim_idx = (hash(trigram.as_bytes(), 37) as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let base_dim = (hash(word.as_bytes(), 31) as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        embedding
    }

    fn image_vector(&self, image: &ImageInput) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        for window in image.base64.as_bytes().chunks(4) {
            let dim_idx = (hash(window, 41) as usize) % self.dimensions;
            embedding[dim_idx] += 1.0;
        }
        embedding
    }
}

fn hash(bytes: &[u8], multiplier: u64) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64))
}

fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut embedding {
            *v /= norm;
        }
    }
    embedding
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(normalize(self.text_vector(text)))
    }

    async fn embed_image(&self, image: &ImageInput, hint: Option<&str>) -> AppResult<Vec<f32>> {
        let mut embedding = self.image_vector(image);
        if let Some(hint) = hint {
            for (v, h) in embedding.iter_mut().zip(self.text_vector(hint)) {
                *v += h;
            }
        }
        Ok(normalize(embedding))
    }
}
