//! Ingestion of papers and images into a shelf collection.
//!
//! Items are processed one at a time. Each item is written to the store before
//! the next one is embedded, so later items in the same run can inherit topics
//! from earlier ones.

use crate::chunker::chunk_text;
use crate::embeddings::{EmbeddingProvider, ImageFormat, ImageInput};
use crate::inference::infer_topics;
use crate::library::{check_topic, store_copies};
use crate::loader::{ContentLoader, FsLoader};
use crate::metadata::{Metadata, KEY_CHUNK, KEY_INDEXED_AT, KEY_KIND, KEY_PATH, KEY_SOURCE, KEY_TOPICS};
use crate::types::{Collection, IndexedItem, IngestReport, StoreRecord};
use crate::vector_store::VectorStore;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use topicshelf_core::config::{ChunkingConfig, InferenceConfig};
use topicshelf_core::{AppError, AppResult};

/// Split a comma-separated topics argument, dropping blank entries.
pub fn parse_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Mean of equally sized vectors.
pub fn centroid(embeddings: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = embeddings.first() else {
        return Vec::new();
    };

    let mut sum = vec![0.0f32; first.len()];
    for embedding in embeddings {
        for (acc, v) in sum.iter_mut().zip(embedding) {
            *acc += v;
        }
    }

    let n = embeddings.len() as f32;
    sum.iter_mut().for_each(|v| *v /= n);
    sum
}

/// Indexes files of one collection.
pub struct Indexer {
    collection: Collection,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    loader: Arc<dyn ContentLoader>,
    save_dir: PathBuf,
    inference: InferenceConfig,
    chunking: ChunkingConfig,
}

impl Indexer {
    /// Create an indexer writing copies under `save_dir`.
    ///
    /// For images, `embedder` must support image embeddings.
    pub fn new(
        collection: Collection,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        save_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collection,
            embedder,
            store,
            loader: Arc::new(FsLoader::new()),
            save_dir: save_dir.into(),
            inference: InferenceConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ContentLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Index a file, or every matching file directly inside a directory.
    ///
    /// `topics` is a comma-separated list of folder names. When absent or
    /// blank, each item's topics are inferred from its neighbors in the store.
    pub async fn add(&self, path: &Path, topics: Option<&str>) -> AppResult<IngestReport> {
        let start = Instant::now();
        let explicit = topics.map(parse_topics).unwrap_or_default();
        for topic in &explicit {
            check_topic(topic)?;
        }

        tracing::info!(
            "Adding {} from {:?} (topics: {})",
            self.collection.table_name(),
            path,
            if explicit.is_empty() {
                "inferred".to_string()
            } else {
                explicit.join(",")
            }
        );

        let files = self.expand(path).await?;
        let mut report = IngestReport::default();

        for file in files {
            let item = match self.collection {
                Collection::Papers => self.index_paper(&file, &explicit).await?,
                Collection::Images => Some(self.index_image(&file, &explicit).await?),
            };

            match item {
                Some(item) => {
                    tracing::info!("Indexed {:?} under {:?}", item.source, item.topics);
                    report.items.push(item);
                }
                None => report.skipped.push(file),
            }
        }

        report.duration_secs = start.elapsed().as_secs_f64();

        tracing::info!(
            "Add completed: {} items, {} records, {} skipped in {:.2}s",
            report.items.len(),
            report.records(),
            report.skipped.len(),
            report.duration_secs
        );

        Ok(report)
    }

    /// Resolve `path` to the files to index, failing before any embedding call.
    async fn expand(&self, path: &Path) -> AppResult<Vec<PathBuf>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| AppError::NotFound(path.to_path_buf()))?;

        if metadata.is_dir() {
            return self
                .loader
                .list_files(path, self.collection.extensions())
                .await;
        }

        if self.collection == Collection::Images {
            ImageFormat::from_path(path)?;
        }

        Ok(vec![path.to_path_buf()])
    }

    async fn resolve_topics(
        &self,
        explicit: &[String],
        embedding: &[f32],
    ) -> AppResult<(Vec<String>, bool)> {
        if !explicit.is_empty() {
            return Ok((explicit.to_vec(), false));
        }

        let topics = infer_topics(
            self.store.as_ref(),
            embedding,
            self.inference.search_top_k,
            self.inference.num_return,
        )
        .await?;

        Ok((topics, true))
    }

    fn base_metadata(&self, source: &Path, topics: &[String], stored: &[PathBuf]) -> Metadata {
        Metadata::new()
            .with_list(
                KEY_PATH,
                stored.iter().map(|p| p.to_string_lossy().to_string()).collect(),
            )
            .with_list(KEY_TOPICS, topics.to_vec())
            .with_text(KEY_SOURCE, source.to_string_lossy())
            .with_text(KEY_KIND, self.collection.kind())
            .with_text(KEY_INDEXED_AT, Utc::now().to_rfc3339())
    }

    /// Index one PDF. Returns `None` when it has no extractable text.
    async fn index_paper(&self, file: &Path, explicit: &[String]) -> AppResult<Option<IndexedItem>> {
        tracing::debug!("Processing paper: {:?}", file);

        let text = self.loader.extract_text(file).await?;
        let chunks = chunk_text(&text, self.chunking.chunk_size, self.chunking.overlap);
        if chunks.is_empty() {
            tracing::warn!("No text extracted from {:?}, skipping", file);
            return Ok(None);
        }

        let prefix = if explicit.is_empty() {
            String::new()
        } else {
            format!("Topics: {}\n", explicit.join(","))
        };
        let inputs: Vec<String> = chunks
            .iter()
            .map(|chunk| format!("{}Passage: {}", prefix, chunk.text))
            .collect();

        let embeddings = self.embedder.embed_batch(&inputs).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let (topics, inferred) = self.resolve_topics(explicit, &centroid(&embeddings)).await?;
        let stored = store_copies(file, &self.save_dir, &topics).await?;
        let metadata = self.base_metadata(file, &topics, &stored);

        let records: Vec<StoreRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                StoreRecord::new(
                    chunk.text,
                    embedding,
                    metadata.clone().with_text(KEY_CHUNK, chunk.position.to_string()),
                )
            })
            .collect();
        let count = records.len();

        self.store.add(records).await?;
        tracing::debug!("Stored {} chunks for {:?}", count, file);

        Ok(Some(IndexedItem {
            source: file.to_path_buf(),
            topics,
            inferred,
            stored_paths: stored,
            records: count,
        }))
    }

    async fn index_image(&self, file: &Path, explicit: &[String]) -> AppResult<IndexedItem> {
        tracing::debug!("Processing image: {:?}", file);

        let image = ImageInput::from_path(file).await?;
        let hint = (!explicit.is_empty()).then(|| format!("Topics: {}", explicit.join(",")));
        let embedding = self.embedder.embed_image(&image, hint.as_deref()).await?;

        let (topics, inferred) = self.resolve_topics(explicit, &embedding).await?;
        let stored = store_copies(file, &self.save_dir, &topics).await?;
        let record = StoreRecord::new(
            file.to_string_lossy(),
            embedding,
            self.base_metadata(file, &topics, &stored),
        );

        self.store.add(vec![record]).await?;

        Ok(IndexedItem {
            source: file.to_path_buf(),
            topics,
            inferred,
            stored_paths: stored,
            records: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics() {
        assert_eq!(parse_topics("ml, nlp ,,vision "), vec!["ml", "nlp", "vision"]);
        assert!(parse_topics(" , ").is_empty());
        assert!(parse_topics("").is_empty());
    }

    #[test]
    fn test_centroid() {
        let mean = centroid(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]]);
        assert_eq!(mean, vec![1.0, 1.0]);
        assert!(centroid(&[]).is_empty());
    }
}
