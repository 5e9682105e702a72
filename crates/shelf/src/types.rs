//! Shelf type definitions.

use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Label assigned when no neighbor carries a topic.
pub const UNKNOWN_TOPIC: &str = "unknown";

/// The two independent collections kept by a shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Papers,
    Images,
}

impl Collection {
    /// Vector store table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Papers => "papers",
            Self::Images => "images",
        }
    }

    /// Value of the `kind` metadata key for records in this collection.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Papers => "paper",
            Self::Images => "image",
        }
    }

    /// Lowercase extensions accepted when expanding a directory.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Papers => &["pdf"],
            Self::Images => &["jpg", "jpeg", "png", "webp", "bmp"],
        }
    }
}

/// A record as written to and read from the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Unique record identifier
    pub id: String,

    /// Chunk text for papers, original path for images
    pub document: String,

    /// Embedding vector
    pub embedding: Vec<f32>,

    /// Topics, stored paths and provenance
    pub metadata: Metadata,
}

impl StoreRecord {
    pub fn new(document: impl Into<String>, embedding: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document: document.into(),
            embedding,
            metadata,
        }
    }
}

/// A store search hit, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub record: StoreRecord,

    /// Cosine similarity to the query
    pub score: f32,
}

/// A formatted search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// First stored copy of the matched item
    pub stored_path: String,

    /// Topics of the matched item
    pub topics: Vec<String>,

    /// Matched chunk text (papers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Cosine similarity to the query
    pub score: f32,
}

/// Outcome of indexing a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Path the item was read from
    pub source: PathBuf,

    /// Resolved topics
    pub topics: Vec<String>,

    /// Whether the topics came from the neighbor vote
    pub inferred: bool,

    /// One copy per topic
    pub stored_paths: Vec<PathBuf>,

    /// Records written to the store
    pub records: usize,
}

/// Summary of an add command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub items: Vec<IndexedItem>,

    /// Files that produced nothing to index
    pub skipped: Vec<PathBuf>,

    pub duration_secs: f64,
}

impl IngestReport {
    /// Total records written.
    pub fn records(&self) -> usize {
        self.items.iter().map(|item| item.records).sum()
    }
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
}

/// Size of one collection, from `stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: Collection,

    /// Records in the vector store
    pub records: usize,

    /// Stored files per topic folder
    pub topics: BTreeMap<String, usize>,
}
