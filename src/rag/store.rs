//! RagStore trait: storage seam for document chunks and their embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A stored document chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    /// UUIDv5 of the chunk text.
    pub chunk_id: String,
    pub content: String,
    /// File name the chunk came from.
    pub source: String,
    /// Header metadata for markdown sections, chunk index, etc.
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait RagStore: Send + Sync {
    /// Inserts chunks, skipping ids that are already stored.
    ///
    /// Returns the number of rows actually written.
    async fn insert_batch(&self, items: Vec<(StoredChunk, Vec<f32>)>) -> Result<usize, ApiError>;

    /// Top `limit` chunks by similarity to `query_embedding`.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError>;

    async fn count(&self) -> Result<usize, ApiError>;

    /// Deletes every chunk, returning how many were removed.
    async fn clear(&self) -> Result<usize, ApiError>;
}
