//! Document chunking.
//!
//! Provides the [`Chunker`] trait and [`BoundaryChunker`], which splits text
//! into fixed-size overlapping slices while preferring natural boundaries
//! (paragraph, sentence, word) over hard character cuts.

use uuid::Uuid;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks with contiguous `sequence_index` from 0.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into overlapping slices of at most `chunk_size` bytes.
///
/// Each slice after the first begins exactly `chunk_overlap` bytes before the
/// previous slice's end, so concatenating the first slice with every later
/// slice minus its first `chunk_overlap` bytes reconstructs the input. When a
/// window does not reach the end of the text, the cut point may move back to
/// the latest paragraph, sentence, or word boundary in the upper half of the
/// window to avoid severing words. A window that reaches the end of the text
/// is emitted whole and ends chunking. Text no longer than `chunk_size`
/// yields exactly one chunk equal to the whole text.
///
/// Cut points always land on `char` boundaries; snapping a cut back to a
/// boundary can widen the effective overlap of one pair by up to three bytes.
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// Sentence-level separators, tried after paragraph breaks.
const SENTENCE_SEPARATORS: &[&str] = &[". ", "! ", "? ", "\n"];

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidArgument(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidArgument(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Split raw text into overlapping slices.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.len() <= self.chunk_size {
            return vec![text];
        }

        let mut slices = Vec::new();
        let mut start = 0;

        loop {
            let window_end = start + self.chunk_size;
            if window_end >= text.len() {
                slices.push(&text[start..]);
                break;
            }

            let end = self.cut_point(text, start, window_end);
            slices.push(&text[start..end]);

            let next = floor_char_boundary(text, end.saturating_sub(self.chunk_overlap));
            // Degenerate overlap/size combinations on multi-byte text could
            // stall; dropping the overlap for that pair keeps progress.
            start = if next > start { next } else { end };
        }

        slices
    }

    /// Choose where to cut a window that does not reach the end of the text.
    ///
    /// Searches the upper half of the window (never closer to `start` than
    /// `chunk_overlap + 1`, so the next slice always advances) for the latest
    /// paragraph break, then sentence boundary, then word boundary, and falls
    /// back to a hard cut at the window end.
    fn cut_point(&self, text: &str, start: usize, window_end: usize) -> usize {
        let hard = floor_char_boundary(text, window_end);
        let lower = start + (self.chunk_size / 2).max(self.chunk_overlap + 1);
        if hard <= lower {
            return hard;
        }
        let lower = ceil_char_boundary(text, lower);
        let region = &text[lower..hard];

        if let Some(idx) = region.rfind("\n\n") {
            return lower + idx + 2;
        }
        if let Some(cut) = SENTENCE_SEPARATORS
            .iter()
            .filter_map(|sep| region.rfind(sep).map(|idx| idx + sep.len()))
            .max()
        {
            return lower + cut;
        }
        if let Some(idx) = region.rfind(' ') {
            return lower + idx + 1;
        }
        hard
    }
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                id: Uuid::new_v4(),
                document_id: document.id,
                filename: document.filename.clone(),
                sequence_index,
                text: text.to_string(),
                embedding: Vec::new(),
                metadata: document.metadata.clone(),
            })
            .collect()
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
