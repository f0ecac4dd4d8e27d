//! Sliding-window chunking over words or BPE tokens.
//!
//! Summarization models accept a bounded number of input tokens, so long documents are cut into
//! overlapping windows before they reach the model:
//!
//! - Sizing: an explicit `CHUNK_SIZE` wins; otherwise three quarters of the model's token ceiling,
//!   clamped into `[200, 800]`.
//! - Windows: each window after the first starts `chunk_size - overlap` units after the previous
//!   one and the last window always ends at the end of the document, so coverage has no gaps.
//! - Units: whitespace-delimited words, or GPT-2 byte-level BPE tokens via `tiktoken-rs`
//!   (`r50k_base`, the vocabulary shared by BART and LED). One request uses one unit kind.

use std::ops::Range;
use std::sync::Arc;
use tiktoken_rs::{CoreBPE, r50k_base};

use super::types::{ChunkUnit, ChunkingError};

const MIN_AUTOMATIC_CHUNK_SIZE: usize = 200;
const MAX_AUTOMATIC_CHUNK_SIZE: usize = 800;

/// Determine the window size for a request, respecting an explicit override.
pub(crate) fn determine_chunk_size(override_size: Option<usize>, token_ceiling: usize) -> usize {
    if let Some(explicit) = override_size {
        return explicit.max(1);
    }

    let base = (token_ceiling / 4 * 3).max(1);
    base.clamp(MIN_AUTOMATIC_CHUNK_SIZE, MAX_AUTOMATIC_CHUNK_SIZE)
}

/// Shared byte-level BPE tokenizer used for token windows and ceiling checks.
#[derive(Clone)]
pub struct BpeTokenizer {
    encoding: Arc<CoreBPE>,
}

impl BpeTokenizer {
    /// Load the GPT-2 (`r50k_base`) encoding.
    pub fn load() -> Result<Self, ChunkingError> {
        let encoding = r50k_base().map_err(|error| ChunkingError::Tokenizer(error.to_string()))?;
        Ok(Self {
            encoding: Arc::new(encoding),
        })
    }

    /// Number of tokens in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.encoding.encode_ordinary(text).len()
    }

    /// Cut `text` down to at most `limit` tokens. Returns the input unchanged when it fits.
    pub fn truncate(&self, text: &str, limit: usize) -> String {
        match self.token_offsets(text) {
            Some(offsets) if offsets.len() - 1 > limit => {
                text[..floor_char_boundary(text, offsets[limit])].to_string()
            }
            _ => text.to_string(),
        }
    }

    /// Byte offset in `text` of every token boundary, starting at `0` and ending at `text.len()`.
    ///
    /// A single token may hold part of a multi-byte character, so interior offsets are not
    /// guaranteed to be character boundaries. Returns `None` when the token bytes do not
    /// reproduce `text`.
    fn token_offsets(&self, text: &str) -> Option<Vec<usize>> {
        let tokens = self.encoding.encode_ordinary(text);
        let mut offsets = Vec::with_capacity(tokens.len() + 1);
        let mut cursor = 0;
        offsets.push(cursor);
        for bytes in self.encoding._decode_native_and_split(tokens) {
            cursor += bytes.len();
            offsets.push(cursor);
        }
        (cursor == text.len()).then_some(offsets)
    }
}

/// Split a document into ordered, overlapping chunks.
///
/// Documents of at most `chunk_size` units come back as a single chunk equal to the input.
pub(crate) fn chunk_document(
    text: &str,
    unit: ChunkUnit,
    chunk_size: usize,
    overlap: usize,
    tokenizer: &BpeTokenizer,
) -> Result<Vec<String>, ChunkingError> {
    match unit {
        ChunkUnit::Words => chunk_words(text, chunk_size, overlap),
        ChunkUnit::Tokens => chunk_tokens(text, chunk_size, overlap, tokenizer),
    }
}

/// Compute unit-index windows over `total` units.
pub(crate) fn window_ranges(
    total: usize,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Range<usize>>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            chunk_size,
            overlap,
        });
    }
    if total <= chunk_size {
        return Ok(vec![0..total]);
    }

    let step = chunk_size - overlap;
    let mut windows = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(total);
        windows.push(start..end);
        if end == total {
            break;
        }
        start += step;
    }
    Ok(windows)
}

fn chunk_words(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkingError> {
    let spans = word_spans(text);
    let windows = window_ranges(spans.len(), chunk_size, overlap)?;
    if windows.len() == 1 {
        return Ok(vec![text.to_string()]);
    }

    Ok(windows
        .into_iter()
        .map(|window| {
            let first = &spans[window.start];
            let last = &spans[window.end - 1];
            text[first.start..last.end].to_string()
        })
        .collect())
}

fn chunk_tokens(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    tokenizer: &BpeTokenizer,
) -> Result<Vec<String>, ChunkingError> {
    let spans = token_window_spans(text, chunk_size, overlap, tokenizer)?;
    if spans.len() == 1 {
        return Ok(vec![text.to_string()]);
    }
    Ok(spans
        .into_iter()
        .map(|span| text[span].to_string())
        .collect())
}

/// Byte ranges of each token window, widened outward onto character boundaries.
fn token_window_spans(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    tokenizer: &BpeTokenizer,
) -> Result<Vec<Range<usize>>, ChunkingError> {
    let offsets = tokenizer
        .token_offsets(text)
        .ok_or(ChunkingError::TokenOffsets)?;
    let windows = window_ranges(offsets.len() - 1, chunk_size, overlap)?;

    // Each edge snaps on its own: start moves back, end moves forward.
    Ok(windows
        .into_iter()
        .map(|window| {
            floor_char_boundary(text, offsets[window.start])
                ..ceil_char_boundary(text, offsets[window.end])
        })
        .collect())
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Byte ranges of whitespace-delimited words.
fn word_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut current: Option<usize> = None;

    for (index, ch) in text.char_indices() {
        match (ch.is_whitespace(), current) {
            (true, Some(start)) => {
                spans.push(start..index);
                current = None;
            }
            (false, None) => current = Some(index),
            _ => {}
        }
    }
    if let Some(start) = current {
        spans.push(start..text.len());
    }

    spans
}
