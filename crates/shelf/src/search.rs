//! Semantic search over a shelf collection.

use crate::embeddings::{EmbeddingProvider, ImageInput};
use crate::types::{Collection, SearchResult};
use crate::vector_store::VectorStore;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use topicshelf_core::{AppError, AppResult};

/// Characters of paper text shown per result.
pub const PREVIEW_CHARS: usize = 300;

/// What to search with.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Free text, embedded with the collection's text embedder.
    Text(String),
    /// An image file, embedded with the image embedder.
    File(PathBuf),
    /// A precomputed embedding.
    Embedding(Vec<f32>),
}

impl SearchQuery {
    /// Interpret a CLI query: an existing file is searched by content for
    /// image collections, anything else as text.
    pub fn parse(raw: &str, collection: Collection) -> Self {
        let path = PathBuf::from(raw);
        if collection == Collection::Images && path.is_file() {
            Self::File(path)
        } else {
            Self::Text(raw.to_string())
        }
    }
}

/// Runs queries against one collection.
pub struct Searcher {
    collection: Collection,
    text_embedder: Arc<dyn EmbeddingProvider>,
    image_embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Arc<dyn VectorStore>,
}

impl Searcher {
    pub fn new(
        collection: Collection,
        text_embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            collection,
            text_embedder,
            image_embedder: None,
            store,
        }
    }

    /// Embedder used for `SearchQuery::File`.
    pub fn with_image_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.image_embedder = Some(embedder);
        self
    }

    async fn embed_query(&self, query: SearchQuery) -> AppResult<Vec<f32>> {
        match query {
            SearchQuery::Embedding(embedding) => Ok(embedding),
            SearchQuery::Text(text) => self.text_embedder.embed_text(&text).await,
            SearchQuery::File(path) => {
                let embedder = self.image_embedder.as_ref().ok_or_else(|| {
                    AppError::Embedding(format!(
                        "No image embedder configured for {} search",
                        self.collection.table_name()
                    ))
                })?;
                if !path.is_file() {
                    return Err(AppError::NotFound(path));
                }
                let image = ImageInput::from_path(&path).await?;
                embedder.embed_image(&image, None).await
            }
        }
    }

    /// Return up to `top_k` matches, best first.
    ///
    /// Paper matches are collapsed to one per stored file, keeping the
    /// best-ranked chunk. No matches is an empty vector.
    pub async fn search(&self, query: SearchQuery, top_k: usize) -> AppResult<Vec<SearchResult>> {
        let embedding = self.embed_query(query).await?;
        let neighbors = self.store.search(&embedding, top_k).await?;

        tracing::debug!(
            "Search in '{}' returned {} neighbors",
            self.collection.table_name(),
            neighbors.len()
        );

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(neighbors.len());

        for neighbor in neighbors {
            let metadata = &neighbor.record.metadata;
            let stored_path = metadata
                .stored_paths()
                .first()
                .cloned()
                .unwrap_or_else(|| neighbor.record.document.clone());

            let content = match self.collection {
                Collection::Papers => {
                    if !seen.insert(stored_path.clone()) {
                        continue;
                    }
                    Some(neighbor.record.document.clone())
                }
                Collection::Images => None,
            };

            results.push(SearchResult {
                stored_path,
                topics: metadata.topics().to_vec(),
                content,
                score: neighbor.score,
            });
        }

        Ok(results)
    }
}

/// Render results as a numbered listing.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.\n".to_string();
    }

    let mut output = String::new();
    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!(
            "--- Result {} (score: {:.3}) ---\n",
            i + 1,
            result.score
        ));
        output.push_str(&format!("Path:   {}\n", result.stored_path));
        output.push_str(&format!("Topics: {}\n", result.topics.join(", ")));
        if let Some(content) = &result.content {
            let preview: String = content.chars().take(PREVIEW_CHARS).collect();
            let ellipsis = if content.chars().count() > PREVIEW_CHARS {
                " ..."
            } else {
                ""
            };
            output.push_str(&preview);
            output.push_str(ellipsis);
            output.push('\n');
        }
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, KEY_PATH, KEY_TOPICS};
    use crate::types::StoreRecord;
    use crate::vector_store::MemoryStore;
    use crate::embeddings::providers::MockProvider;

    fn chunk(text: &str, path: &str, embedding: Vec<f32>) -> StoreRecord {
        StoreRecord::new(
            text,
            embedding,
            Metadata::new()
                .with_list(KEY_PATH, vec![path.to_string()])
                .with_list(KEY_TOPICS, vec!["ml".to_string()]),
        )
    }

    fn searcher(collection: Collection, store: Arc<MemoryStore>) -> Searcher {
        Searcher::new(collection, Arc::new(MockProvider::new(8)), store)
    }

    #[tokio::test]
    async fn test_paper_results_dedup_by_stored_path() {
        let store = Arc::new(MemoryStore::new());
        store
            .add(vec![
                chunk("a1", "lib/ml/a.pdf", vec![1.0, 0.0]),
                chunk("b1", "lib/ml/b.pdf", vec![0.8, 0.2]),
                chunk("a2", "lib/ml/a.pdf", vec![0.9, 0.1]),
            ])
            .await
            .unwrap();

        let results = searcher(Collection::Papers, store)
            .search(SearchQuery::Embedding(vec![1.0, 0.0]), 5)
            .await
            .unwrap();

        let paths: Vec<&str> = results.iter().map(|r| r.stored_path.as_str()).collect();
        assert_eq!(paths, vec!["lib/ml/a.pdf", "lib/ml/b.pdf"]);
        assert_eq!(results[0].content.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_image_results_are_not_collapsed() {
        let store = Arc::new(MemoryStore::new());
        store
            .add(vec![
                chunk("x.png", "lib/cats/x.png", vec![1.0, 0.0]),
                chunk("x.png", "lib/cats/x.png", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = searcher(Collection::Images, store)
            .search(SearchQuery::Embedding(vec![1.0, 0.0]), 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].content.is_none());
    }

    #[tokio::test]
    async fn test_empty_store_returns_no_results() {
        let store = Arc::new(MemoryStore::new());
        let results = searcher(Collection::Papers, store)
            .search(SearchQuery::Text("graph neural networks".to_string()), 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_file_query_needs_image_embedder() {
        let store = Arc::new(MemoryStore::new());
        let err = searcher(Collection::Images, store)
            .search(SearchQuery::File(PathBuf::from("cat.png")), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            SearchQuery::parse("sunset over water", Collection::Images),
            SearchQuery::Text("sunset over water".to_string())
        );
        assert_eq!(
            SearchQuery::parse("Cargo.toml", Collection::Papers),
            SearchQuery::Text("Cargo.toml".to_string())
        );
    }

    #[test]
    fn test_format_results_truncates_content() {
        let results = vec![SearchResult {
            stored_path: "lib/ml/a.pdf".to_string(),
            topics: vec!["ml".to_string(), "nlp".to_string()],
            content: Some("x".repeat(400)),
            score: 0.9,
        }];

        let output = format_results(&results);
        assert!(output.contains("--- Result 1"));
        assert!(output.contains("Topics: ml, nlp"));
        assert!(output.contains(&format!("{} ...", "x".repeat(300))));
        assert!(!output.contains(&"x".repeat(301)));
        assert_eq!(format_results(&[]), "No results found.\n");
    }

    #[test]
    fn test_format_image_result_layout() {
        let results = vec![SearchResult {
            stored_path: "lib/cats/x.png".to_string(),
            topics: vec!["cats".to_string()],
            content: None,
            score: 0.5,
        }];

        assert_eq!(
            format_results(&results),
            "--- Result 1 (score: 0.500) ---\nPath:   lib/cats/x.png\nTopics: cats\n\n"
        );
    }
}
