//! Vector store abstraction for shelf records.
//!
//! Defines a trait for backend-agnostic record storage and nearest-neighbor
//! retrieval, plus a brute-force in-memory backend.

use crate::types::{Neighbor, StoreRecord};
use async_trait::async_trait;
use std::sync::RwLock;
use topicshelf_core::{AppError, AppResult};

/// Trait for vector store backends.
///
/// Stores are append-only: records are never updated or deleted once added.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append records. Every record in one call must share a dimension.
    async fn add(&self, records: Vec<StoreRecord>) -> AppResult<()>;

    /// Search for the `top_k` records most similar to `embedding`.
    ///
    /// Returns neighbors ordered by descending similarity. An empty store
    /// yields an empty vector.
    async fn search(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<Neighbor>>;

    /// Number of records in the store.
    async fn count(&self) -> AppResult<usize>;
}

/// In-memory store with exhaustive cosine search.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add(&self, records: Vec<StoreRecord>) -> AppResult<()> {
        let mut guard = self
            .records
            .write()
            .map_err(|e| AppError::Store(format!("Memory store lock poisoned: {}", e)))?;
        guard.extend(records);
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<Neighbor>> {
        let guard = self
            .records
            .read()
            .map_err(|e| AppError::Store(format!("Memory store lock poisoned: {}", e)))?;

        let mut neighbors: Vec<Neighbor> = guard
            .iter()
            .map(|record| Neighbor {
                score: cosine_similarity(embedding, &record.embedding),
                record: record.clone(),
            })
            .collect();

        // Stable: equal scores keep insertion order
        neighbors.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(top_k);

        Ok(neighbors)
    }

    async fn count(&self) -> AppResult<usize> {
        let guard = self
            .records
            .read()
            .map_err(|e| AppError::Store(format!("Memory store lock poisoned: {}", e)))?;
        Ok(guard.len())
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, KEY_TOPICS};

    fn record(document: &str, embedding: Vec<f32>) -> StoreRecord {
        StoreRecord::new(
            document,
            embedding,
            Metadata::new().with_list(KEY_TOPICS, vec!["t".to_string()]),
        )
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_empty_store_searches_empty() {
        let store = MemoryStore::new();
        assert!(store.search(&[1.0, 0.0], 3).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_orders_by_score_and_limits() {
        let store = MemoryStore::new();
        store
            .add(vec![
                record("far", vec![0.0, 1.0]),
                record("near", vec![1.0, 0.1]),
                record("mid", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        let docs: Vec<&str> = hits.iter().map(|n| n.record.document.as_str()).collect();

        assert_eq!(docs, vec!["near", "mid"]);
        assert!(hits[0].score >= hits[1].score);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let store = MemoryStore::new();
        store
            .add(vec![record("first", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .add(vec![record("second", vec![2.0, 0.0])])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits[0].record.document, "first");
        assert_eq!(hits[1].record.document, "second");
    }
}
