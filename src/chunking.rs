//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], a
//! cascading splitter that breaks on paragraph boundaries first, then line
//! breaks, then sentence boundaries, then words, and only as a last resort
//! on hard character cutoffs.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};
use crate::llm::estimate_tokens;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Must be deterministic: the same text and configuration yield a
    /// byte-identical chunk sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidInput`] if the document text is empty or
    /// whitespace-only.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Separator cascade, coarsest first. Text that still exceeds the chunk
/// size after the last level falls through to a hard character cutoff.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits text hierarchically with overlap between adjacent chunks.
///
/// Segments produced at each cascade level are merged greedily up to
/// `chunk_size` characters. When a chunk is flushed, the next chunk is
/// seeded with the trailing segments of the previous one, up to
/// `chunk_overlap` characters, so adjacent chunks share context across the
/// boundary. Text shorter than `chunk_size` yields exactly one chunk.
///
/// Chunk IDs are generated as `{document_id}_{position}`. Each chunk
/// inherits the parent document's metadata plus `position`, `total_chunks`,
/// and `token_count` fields.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 150);
/// let chunks = chunker.chunk(&document)?;
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - overlap budget between adjacent chunks, in characters
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Create a chunker sized from a [`RagConfig`](crate::RagConfig).
    pub fn from_config(config: &crate::config::RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap())
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        if document.text.trim().is_empty() {
            return Err(RagError::InvalidInput(
                "document text is empty or whitespace-only".to_string(),
            ));
        }

        let raw = split_and_merge(&document.text, self.chunk_size, self.chunk_overlap, &SEPARATORS);
        let total = raw.len();

        Ok(raw
            .into_iter()
            .enumerate()
            .map(|(position, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("position".to_string(), position.to_string());
                metadata.insert("total_chunks".to_string(), total.to_string());
                metadata.insert("token_count".to_string(), estimate_tokens(&text).to_string());
                Chunk {
                    id: format!("{}_{position}", document.id),
                    text,
                    position,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect())
    }
}

/// Split text at the first cascade level present, merging segments into
/// chunks that respect `chunk_size`. Segments that exceed `chunk_size` on
/// their own are split further using the next level.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let segments = split_keeping_separator(text, separator);

    let mut chunks: Vec<String> = Vec::new();
    // Segments accumulated for the chunk currently being built.
    let mut window: Vec<String> = Vec::new();
    let mut window_len = 0usize;

    for segment in segments {
        if segment.len() > chunk_size {
            // Indivisible at this level: flush, then descend a level.
            if !window.is_empty() {
                chunks.push(window.concat());
                window.clear();
                window_len = 0;
            }
            chunks.extend(split_and_merge(segment, chunk_size, chunk_overlap, rest));
            continue;
        }

        if window_len + segment.len() > chunk_size && !window.is_empty() {
            chunks.push(window.concat());
            // Seed the next chunk with trailing segments up to the overlap
            // budget, so adjacent chunks share context at the boundary.
            let mut kept: Vec<String> = Vec::new();
            let mut kept_len = 0usize;
            while let Some(last) = window.pop() {
                if kept_len + last.len() > chunk_overlap {
                    break;
                }
                kept_len += last.len();
                kept.insert(0, last);
            }
            // The seed plus the incoming segment must still fit.
            while kept_len + segment.len() > chunk_size && !kept.is_empty() {
                let first = kept.remove(0);
                kept_len -= first.len();
            }
            window = kept;
            window_len = kept_len;
        }

        window_len += segment.len();
        window.push(segment.to_string());
    }

    if !window.is_empty() {
        chunks.push(window.concat());
    }

    chunks
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so concatenating the segments reproduces the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Hard character-cutoff splitting with overlap: chunk i+1 starts
/// `chunk_size - chunk_overlap` characters after chunk i starts.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + chunk_size).min(text.len()));
        if end <= start {
            end = ceil_char_boundary(text, start + 1);
        }
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        let next = floor_char_boundary(text, start + step);
        start = if next > start { next } else { ceil_char_boundary(text, start + 1) };
    }

    chunks
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document { id: "doc".to_string(), ..Document::new(text) }
    }

    /// Longest shared suffix-of-left / prefix-of-right, in bytes.
    fn shared_boundary_len(left: &str, right: &str) -> usize {
        (1..=left.len().min(right.len()))
            .rev()
            .find(|&len| right.is_char_boundary(len) && left.ends_with(&right[..len]))
            .unwrap_or(0)
    }

    #[test]
    fn empty_text_is_invalid_input() {
        let chunker = RecursiveChunker::new(100, 20);
        assert!(matches!(chunker.chunk(&doc("")), Err(RagError::InvalidInput(_))));
        assert!(matches!(chunker.chunk(&doc("  \n\t ")), Err(RagError::InvalidInput(_))));
    }

    #[test]
    fn short_text_yields_single_chunk_at_position_zero() {
        let chunker = RecursiveChunker::new(1000, 150);
        let chunks = chunker.chunk(&doc("a short document")).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].text, "a short document");
        assert_eq!(chunks[0].id, "doc_0");
        assert_eq!(chunks[0].metadata["total_chunks"], "1");
    }

    #[test]
    fn chunking_is_deterministic() {
        let text: String =
            (0..120).map(|i| format!("Sentence number {i} with a few words. ")).collect();
        let chunker = RecursiveChunker::new(200, 40);
        let first = chunker.chunk(&doc(&text)).unwrap();
        let second = chunker.chunk(&doc(&text)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_chunk_exceeds_chunk_size() {
        let text: String =
            (0..80).map(|i| format!("Paragraph {i} talks about something.\n\n")).collect();
        let chunker = RecursiveChunker::new(150, 30);
        for chunk in chunker.chunk(&doc(&text)).unwrap() {
            assert!(chunk.text.len() <= 150, "chunk of {} bytes", chunk.text.len());
        }
    }

    #[test]
    fn hard_cutoff_stride_is_size_minus_overlap() {
        // No separators at all, so the cascade falls through to the
        // character cutoff: starts at 0, 850, 1700.
        let text = "a".repeat(2500);
        let chunker = RecursiveChunker::new(1000, 150);
        let chunks = chunker.chunk(&doc(&text)).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 1000);
        assert_eq!(chunks[1].text.len(), 1000);
        assert_eq!(chunks[2].text.len(), 800);
    }

    #[test]
    fn adjacent_chunks_share_boundary_text() {
        let text: String =
            (0..60).map(|i| format!("Sentence number {i} carries some content. ")).collect();
        let chunker = RecursiveChunker::new(300, 60);
        let chunks = chunker.chunk(&doc(&text)).unwrap();
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            assert!(
                shared_boundary_len(&pair[0].text, &pair[1].text) > 0,
                "chunks share no boundary text: {:?} / {:?}",
                pair[0].text,
                pair[1].text
            );
        }
    }

    #[test]
    fn positions_are_sequential_and_metadata_carried() {
        let text: String = (0..40).map(|i| format!("Line {i} of the manual.\n")).collect();
        let chunker = RecursiveChunker::new(120, 20);
        let document = Document { id: "doc".to_string(), ..Document::new(text) }
            .with_source("manual.txt")
            .with_title("Manual");
        let chunks = chunker.chunk(&document).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i);
            assert_eq!(chunk.metadata["position"], i.to_string());
            assert_eq!(chunk.metadata["source"], "manual.txt");
            assert_eq!(chunk.metadata["title"], "Manual");
        }
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "héllo wörld ünïcode ".repeat(60);
        let chunker = RecursiveChunker::new(100, 20);
        // Must not panic slicing mid-codepoint.
        let chunks = chunker.chunk(&doc(&text)).unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn zero_overlap_produces_disjoint_cutoffs() {
        let text = "x".repeat(250);
        let chunks = split_by_size(&text, 100, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(String::len).sum::<usize>(), 250);
    }
}
