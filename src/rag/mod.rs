//! Retrieval: document chunking, embedding storage and similarity search.

pub mod index;
pub mod splitter;
pub mod sqlite;
pub mod store;

pub use index::{DocumentIndex, IngestReport};
pub use splitter::{split_markdown_sections, MarkdownSection, TextSplitter};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
