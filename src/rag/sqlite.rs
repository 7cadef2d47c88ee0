//! SQLite-backed RAG store.
//!
//! Chunks live in one table per collection with their embeddings as
//! little-endian f32 blobs; search is brute-force cosine similarity.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteRagStore {
    pool: SqlitePool,
    collection: String,
}

impl SqliteRagStore {
    pub async fn new(paths: &AppPaths, collection: &str) -> Result<Self, ApiError> {
        if let Some(parent) = paths.vector_db_path.parent() {
            std::fs::create_dir_all(parent).map_err(ApiError::internal)?;
        }
        Self::with_path(paths.vector_db_path.clone(), collection).await
    }

    pub async fn with_path(db_path: PathBuf, collection: &str) -> Result<Self, ApiError> {
        let collection = sanitize_collection(collection)?;

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, collection };
        store.init_schema().await?;
        tracing::info!(
            path = %db_path.display(),
            collection = %store.collection,
            "Vector store ready"
        );
        Ok(store)
    }

    fn table(&self) -> String {
        format!("chunks_{}", self.collection)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT NOT NULL DEFAULT '{{}}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
            self.table()
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata_str: String = row.get("metadata");
        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            metadata: serde_json::from_str::<Value>(&metadata_str).ok(),
        }
    }
}

fn sanitize_collection(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ApiError::BadRequest(format!(
            "Invalid vector collection name '{}'",
            name
        )));
    }
    Ok(name.to_string())
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<usize, ApiError> {
        if items.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "INSERT OR IGNORE INTO {} (chunk_id, content, source, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            self.table()
        );

        let mut inserted = 0;
        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        for (chunk, embedding) in &items {
            let metadata_str = match &chunk.metadata {
                Some(m) => serde_json::to_string(m).map_err(ApiError::internal)?,
                None => "{}".to_string(),
            };
            let result = sqlx::query(&sql)
                .bind(&chunk.chunk_id)
                .bind(&chunk.content)
                .bind(&chunk.source)
                .bind(&metadata_str)
                .bind(Self::serialize_embedding(embedding))
                .execute(&mut *tx)
                .await
                .map_err(ApiError::internal)?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(ApiError::internal)?;

        Ok(inserted)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let sql = format!(
            "SELECT chunk_id, content, source, metadata, embedding FROM {}",
            self.table()
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let mut scored: Vec<ChunkSearchResult> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                Some(ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    score: cosine_similarity(query_embedding, &stored),
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table());
        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<usize, ApiError> {
        let sql = format!("DELETE FROM {}", self.table());
        let result = sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(result.rows_affected() as usize)
    }
}
