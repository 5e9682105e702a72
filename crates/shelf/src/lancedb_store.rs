//! LanceDB-backed vector store implementation.

use crate::metadata::Metadata;
use crate::types::{Collection, Neighbor, StoreRecord};
use crate::vector_store::VectorStore;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use topicshelf_core::{AppError, AppResult};

/// LanceDB-backed store holding one collection in one table.
///
/// The table is created on first write, using the dimension of the first
/// embedding written. Until then the store searches as empty.
pub struct LanceDbStore {
    conn: Connection,
    table_name: String,
    table: Mutex<Option<Table>>,
}

impl LanceDbStore {
    /// Open the store for `collection` in the database at `db_path`.
    pub async fn open(db_path: &Path, collection: Collection) -> AppResult<Self> {
        tokio::fs::create_dir_all(db_path).await.map_err(|e| {
            AppError::Store(format!("Failed to create store directory {:?}: {}", db_path, e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_name = collection.table_name().to_string();
        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.contains(&table_name) {
            Some(
                conn.open_table(&table_name)
                    .execute()
                    .await
                    .map_err(|e| AppError::Store(format!("Failed to open table: {}", e)))?,
            )
        } else {
            None
        };

        tracing::debug!(
            "Opened LanceDB store at {:?} (table '{}', exists: {})",
            db_path,
            table_name,
            table.is_some()
        );

        Ok(Self {
            conn,
            table_name,
            table: Mutex::new(table),
        })
    }

    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("document", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            // Scalar-encoded metadata as a JSON object of strings
            Field::new("metadata", DataType::Utf8, false),
        ]))
    }

    fn records_to_batch(records: &[StoreRecord], embedding_dim: usize) -> AppResult<RecordBatch> {
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != embedding_dim) {
            return Err(AppError::Store(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                embedding_dim,
                bad.embedding.len()
            )));
        }

        let schema = Self::create_schema(embedding_dim);

        let ids = StringArray::from_iter_values(records.iter().map(|r| r.id.as_str()));
        let documents = StringArray::from_iter_values(records.iter().map(|r| r.document.as_str()));
        let metadata =
            StringArray::from_iter_values(records.iter().map(|r| r.metadata.to_json()));

        let values = Float32Array::from_iter_values(
            records.iter().flat_map(|r| r.embedding.iter().copied()),
        );
        let embeddings = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            embedding_dim as i32,
            Arc::new(values),
            None,
        )
        .map_err(|e| AppError::Store(format!("Failed to build embedding column: {}", e)))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(documents),
                Arc::new(embeddings),
                Arc::new(metadata),
            ],
        )
        .map_err(|e| AppError::Store(format!("Failed to create RecordBatch: {}", e)))
    }

    fn batch_to_neighbors(batch: &RecordBatch) -> AppResult<Vec<Neighbor>> {
        let strings = |name: &str| -> AppResult<&StringArray> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| AppError::Store(format!("Invalid {} column", name)))
        };

        let ids = strings("id")?;
        let documents = strings("document")?;
        let metadata = strings("metadata")?;
        let embeddings = batch
            .column_by_name("embedding")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| AppError::Store("Invalid embedding column".to_string()))?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let mut neighbors = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let values = embeddings.value(row);
            let embedding = values
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| AppError::Store("Invalid embedding values".to_string()))?
                .values()
                .to_vec();

            let metadata = Metadata::from_json(metadata.value(row))
                .map_err(|e| AppError::Store(format!("Failed to parse metadata: {}", e)))?;

            // Cosine distance to similarity
            let score = distances.map(|d| 1.0 - d.value(row)).unwrap_or(0.0);

            neighbors.push(Neighbor {
                record: StoreRecord {
                    id: ids.value(row).to_string(),
                    document: documents.value(row).to_string(),
                    embedding,
                    metadata,
                },
                score,
            });
        }

        Ok(neighbors)
    }
}

/// Dimension of the embedding column in an existing table.
async fn table_dimension(table: &Table) -> AppResult<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| AppError::Store(format!("Failed to read table schema: {}", e)))?;

    match schema.field_with_name("embedding").map(|f| f.data_type()) {
        Ok(DataType::FixedSizeList(_, size)) => Ok(*size as usize),
        _ => Err(AppError::Store(
            "Table has no fixed-size embedding column".to_string(),
        )),
    }
}

#[async_trait]
impl VectorStore for LanceDbStore {
    async fn add(&self, records: Vec<StoreRecord>) -> AppResult<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        let mut guard = self.table.lock().await;

        match guard.as_ref() {
            Some(table) => {
                let batch = Self::records_to_batch(&records, table_dimension(table).await?)?;
                let schema = batch.schema();
                table
                    .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                    .execute()
                    .await
                    .map_err(|e| AppError::Store(format!("Failed to add records: {}", e)))?;
            }
            None => {
                let batch = Self::records_to_batch(&records, first.embedding.len())?;
                let schema = batch.schema();
                let table = self
                    .conn
                    .create_table(
                        &self.table_name,
                        RecordBatchIterator::new(vec![Ok(batch)], schema),
                    )
                    .execute()
                    .await
                    .map_err(|e| AppError::Store(format!("Failed to create table: {}", e)))?;

                tracing::info!(
                    "Created LanceDB table '{}' ({} dimensions)",
                    self.table_name,
                    first.embedding.len()
                );
                *guard = Some(table);
            }
        }

        tracing::debug!("Inserted {} records into '{}'", records.len(), self.table_name);
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> AppResult<Vec<Neighbor>> {
        let guard = self.table.lock().await;
        let Some(table) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let dimension = table_dimension(table).await?;
        if embedding.len() != dimension {
            return Err(AppError::Store(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                dimension,
                embedding.len()
            )));
        }

        let batches = table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| AppError::Store(format!("Failed to create query: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to collect results: {}", e)))?;

        let mut neighbors = Vec::new();
        for batch in &batches {
            neighbors.extend(Self::batch_to_neighbors(batch)?);
        }

        tracing::debug!(
            "Retrieved {} records from '{}' (requested top-{})",
            neighbors.len(),
            self.table_name,
            top_k
        );

        Ok(neighbors)
    }

    async fn count(&self) -> AppResult<usize> {
        let guard = self.table.lock().await;
        match guard.as_ref() {
            Some(table) => table
                .count_rows(None)
                .await
                .map_err(|e| AppError::Store(format!("Failed to count rows: {}", e))),
            None => Ok(0),
        }
    }
}
