//! Topic shelf: papers and images indexed by embedding and filed by topic.
//!
//! New items are labeled by a majority vote over the topics of their nearest
//! neighbors already in the store, then copied into one folder per topic.

pub mod chunker;
pub mod embeddings;
pub mod indexing;
pub mod inference;
pub mod lancedb_store;
pub mod library;
pub mod loader;
pub mod metadata;
pub mod search;
pub mod types;
pub mod vector_store;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider, ImageFormat, ImageInput};
pub use indexing::{parse_topics, Indexer};
pub use inference::{infer_topics, TopicTally};
pub use lancedb_store::LanceDbStore;
pub use loader::{ContentLoader, FsLoader};
pub use metadata::{Metadata, MetadataValue};
pub use search::{format_results, SearchQuery, Searcher};
pub use types::{
    Collection, CollectionStats, IndexedItem, IngestReport, Neighbor, SearchResult, StoreRecord,
    UNKNOWN_TOPIC,
};
pub use vector_store::{MemoryStore, VectorStore};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use topicshelf_core::config::ProviderConfig;
use topicshelf_core::{AppConfig, AppError, AppResult};

/// Root of the topic folders for `collection`.
pub fn save_dir(config: &AppConfig, collection: Collection) -> PathBuf {
    match collection {
        Collection::Papers => config.paper_dir(),
        Collection::Images => config.image_dir(),
    }
}

/// Open the persistent store for `collection`.
pub async fn open_store(
    config: &AppConfig,
    collection: Collection,
) -> AppResult<Arc<dyn VectorStore>> {
    let store = LanceDbStore::open(&config.persist_dir(), collection).await?;
    Ok(Arc::new(store))
}

fn build_provider(config: &AppConfig, provider: &ProviderConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let api_key = config.resolve_api_key(provider)?;
    let embedder = create_provider(provider, api_key)?;
    tracing::debug!(
        "Using embedding provider {} ({})",
        embedder.provider_name(),
        embedder.model_name()
    );
    Ok(embedder)
}

/// Embedder for text queries against `collection`.
///
/// Image collections use `models.imageText`, which must share the image
/// model's embedding space.
pub fn text_embedder(
    config: &AppConfig,
    collection: Collection,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match collection {
        Collection::Papers => build_provider(config, &config.models.paper),
        Collection::Images => build_provider(config, &config.models.image_text),
    }
}

/// Embedder for image content (`models.image`).
pub fn image_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let embedder = build_provider(config, &config.models.image)?;
    if !embedder.supports_images() {
        return Err(AppError::Config(format!(
            "models.image uses '{}', which cannot embed images",
            config.models.image.service()
        )));
    }
    Ok(embedder)
}

/// Build the indexer for `collection` from configuration.
pub async fn indexer(config: &AppConfig, collection: Collection) -> AppResult<Indexer> {
    let embedder = match collection {
        Collection::Papers => text_embedder(config, collection)?,
        Collection::Images => image_embedder(config)?,
    };
    let store = open_store(config, collection).await?;

    Ok(Indexer::new(collection, embedder, store, save_dir(config, collection))
        .with_inference(config.inference)
        .with_chunking(config.chunking))
}

/// Reject a missing path or unusable topic names before any provider is built.
fn check_inputs(path: &Path, topics: Option<&str>) -> AppResult<()> {
    if !path.exists() {
        return Err(AppError::NotFound(path.to_path_buf()));
    }
    for topic in topics.map(parse_topics).unwrap_or_default() {
        library::check_topic(&topic)?;
    }
    Ok(())
}

/// Index a PDF, or every PDF directly inside a directory.
pub async fn add_papers(
    config: &AppConfig,
    path: &Path,
    topics: Option<&str>,
) -> AppResult<IngestReport> {
    check_inputs(path, topics)?;
    indexer(config, Collection::Papers).await?.add(path, topics).await
}

/// Index an image, or every supported image directly inside a directory.
pub async fn add_images(
    config: &AppConfig,
    path: &Path,
    topics: Option<&str>,
) -> AppResult<IngestReport> {
    check_inputs(path, topics)?;
    indexer(config, Collection::Images).await?.add(path, topics).await
}

/// Build the searcher able to answer `query` against `collection`.
///
/// The image embedder is only constructed for file queries.
pub async fn searcher(
    config: &AppConfig,
    collection: Collection,
    query: &SearchQuery,
) -> AppResult<Searcher> {
    let store = open_store(config, collection).await?;
    let searcher = Searcher::new(collection, text_embedder(config, collection)?, store);

    match query {
        SearchQuery::File(_) => Ok(searcher.with_image_embedder(image_embedder(config)?)),
        _ => Ok(searcher),
    }
}

/// Record and topic-folder counts for `collection`.
pub async fn stats(config: &AppConfig, collection: Collection) -> AppResult<CollectionStats> {
    let store = open_store(config, collection).await?;
    let records = store.count().await?;
    let topics = library::topic_counts(&save_dir(config, collection)).await?;

    tracing::debug!(
        "{}: {} records in {} topics",
        collection.table_name(),
        records,
        topics.len()
    );

    Ok(CollectionStats {
        collection,
        records,
        topics,
    })
}
