//! Text chunking for document ingestion.
//!
//! `TextSplitter` splits recursively on progressively finer separators and
//! merges the pieces back into chunks of at most `chunk_size` characters,
//! keeping up to `chunk_overlap` characters of trailing context between
//! neighbours. Sizes are measured in chars, not bytes.

use std::collections::{BTreeMap, VecDeque};

use crate::core::config::defaults::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::core::errors::ApiError;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ApiError> {
        if chunk_size == 0 {
            return Err(ApiError::BadRequest("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(ApiError::BadRequest(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator present in the text; "" always matches.
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                if total > self.chunk_size {
                    tracing::warn!(
                        size = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk larger than the configured size"
                    );
                }
                push_joined(&mut chunks, &window, separator);

                // Drop from the front until the remainder fits as overlap.
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    let dropped_joiner = if window.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(char_len(front) + dropped_joiner);
                }
            }

            let joiner = if window.is_empty() { 0 } else { separator_len };
            window.push_back(piece);
            total += len + joiner;
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// A markdown section with the `#`/`##` headers it sits under.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownSection {
    pub content: String,
    /// `"Header 1"` / `"Header 2"` → header text.
    pub headers: BTreeMap<String, String>,
}

/// Splits markdown on level-1 and level-2 headers. Header lines are removed
/// from the content and recorded as metadata; headers inside fenced code
/// blocks are treated as text.
pub fn split_markdown_sections(text: &str) -> Vec<MarkdownSection> {
    let mut sections = Vec::new();
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.starts_with("```") || stripped.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let header = if in_fence {
            None
        } else {
            header_level(stripped)
        };

        match header {
            Some((level, title)) => {
                flush_section(&mut sections, &mut lines, &headers);
                if level == 1 {
                    headers.clear();
                    headers.insert("Header 1".to_string(), title.to_string());
                } else {
                    headers.insert("Header 2".to_string(), title.to_string());
                }
            }
            None => lines.push(line),
        }
    }
    flush_section(&mut sections, &mut lines, &headers);

    sections
}

fn header_level(line: &str) -> Option<(u8, &str)> {
    if let Some(rest) = line.strip_prefix("## ") {
        return Some((2, rest.trim()));
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return Some((1, rest.trim()));
    }
    match line {
        "##" => Some((2, "")),
        "#" => Some((1, "")),
        _ => None,
    }
}

fn flush_section(
    sections: &mut Vec<MarkdownSection>,
    lines: &mut Vec<&str>,
    headers: &BTreeMap<String, String>,
) {
    let content = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    lines.clear();
    let content = content.trim();
    if content.is_empty() {
        return;
    }
    sections.push(MarkdownSection {
        content: content.to_string(),
        headers: headers.clone(),
    });
}
