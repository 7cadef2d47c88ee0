//! Document ingestion and similarity lookup on top of a `RagStore`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::splitter::{split_markdown_sections, TextSplitter};
use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::config::settings::RagSettings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

const EMBED_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Markdown,
}

impl DocumentKind {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    /// Unique chunks produced from the document.
    pub chunks: usize,
    /// Chunks that were not already in the store.
    pub inserted: usize,
}

pub struct DocumentIndex {
    store: Arc<dyn RagStore>,
    llm: Arc<dyn LlmProvider>,
    embedding_model: String,
    splitter: TextSplitter,
    top_k: usize,
    min_score: Option<f32>,
}

impl DocumentIndex {
    pub fn new(
        store: Arc<dyn RagStore>,
        llm: Arc<dyn LlmProvider>,
        settings: &RagSettings,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            store,
            llm,
            embedding_model: settings.embedding_model.clone(),
            splitter: TextSplitter::new(settings.chunk_size, settings.chunk_overlap)?,
            top_k: settings.top_k.max(1),
            min_score: settings.min_score,
        })
    }

    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, ApiError> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            ApiError::UnsupportedDocument(format!(
                "{}: only .txt and .md documents can be ingested",
                source
            ))
        })?;

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    ApiError::NotFound(format!("Document not found: {}", path.display()))
                }
                std::io::ErrorKind::InvalidData => {
                    ApiError::BadRequest(format!("{} is not valid UTF-8 text", source))
                }
                _ => ApiError::internal(err),
            })?;

        let chunks = self.chunk_document(&text, kind, &source);
        let total = chunks.len();

        let mut inserted = 0;
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let inputs: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.llm.embed(&inputs, &self.embedding_model).await?;
            let items = batch.iter().cloned().zip(embeddings).collect();
            inserted += self.store.insert_batch(items).await?;
        }

        tracing::info!(
            source = %source,
            chunks = total,
            inserted,
            "Ingested document"
        );

        Ok(IngestReport {
            source,
            chunks: total,
            inserted,
        })
    }

    fn chunk_document(&self, text: &str, kind: DocumentKind, source: &str) -> Vec<StoredChunk> {
        let pieces: Vec<(String, serde_json::Value)> = match kind {
            DocumentKind::Text => self
                .splitter
                .split_text(text)
                .into_iter()
                .map(|content| (content, json!({})))
                .collect(),
            DocumentKind::Markdown => split_markdown_sections(text)
                .into_iter()
                .flat_map(|section| {
                    let headers = json!(section.headers);
                    self.splitter
                        .split_text(&section.content)
                        .into_iter()
                        .map(move |content| (content, headers.clone()))
                })
                .collect(),
        };

        let mut seen = HashSet::new();
        pieces
            .into_iter()
            .filter_map(|(content, mut metadata)| {
                let chunk_id = chunk_id(&content);
                if !seen.insert(chunk_id.clone()) {
                    return None;
                }
                if let Some(obj) = metadata.as_object_mut() {
                    obj.insert("chunk_index".to_string(), json!(seen.len() - 1));
                }
                Some(StoredChunk {
                    chunk_id,
                    content,
                    source: source.to_string(),
                    metadata: Some(metadata),
                })
            })
            .collect()
    }

    /// Top-k chunks for `query`, dropping any below the configured minimum score.
    pub async fn similar(&self, query: &str) -> Result<Vec<ChunkSearchResult>, ApiError> {
        if self.store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let embedding = self
            .llm
            .embed(&[query.to_string()], &self.embedding_model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("Embedding response was empty".to_string()))?;

        let mut results = self.store.search(&embedding, self.top_k).await?;
        if let Some(min) = self.min_score {
            results.retain(|r| r.score >= min);
        }
        tracing::debug!(hits = results.len(), "Vector search complete");
        Ok(results)
    }

    pub async fn clear(&self) -> Result<usize, ApiError> {
        let deleted = self.store.clear().await?;
        tracing::info!("Deleting {} documents", deleted);
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<usize, ApiError> {
        self.store.count().await
    }
}

/// UUIDv5 (DNS namespace) of the chunk text.
pub fn chunk_id(content: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, content.as_bytes()).to_string()
}
