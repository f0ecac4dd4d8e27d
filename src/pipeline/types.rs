//! Core data types and error definitions for the summarization pipeline.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while splitting a document into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A window of zero units cannot make progress.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for each window to advance.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    InvalidOverlap {
        /// Requested window size.
        chunk_size: usize,
        /// Requested overlap.
        overlap: usize,
    },
    /// Tokenizer resources could not be loaded.
    #[error("failed to initialize tokenizer: {0}")]
    Tokenizer(String),
    /// Token bytes did not reproduce the document they were encoded from.
    #[error("token boundaries do not line up with the document text")]
    TokenOffsets,
}

/// Errors emitted by the summarization pipeline and surfaced to callers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request body was missing, malformed, or carried no text.
    #[error("{0}")]
    InvalidInput(String),
    /// Document exceeds the loaded model's absolute token ceiling.
    #[error("Input too long: {tokens} tokens exceeds the {limit} token limit of {model}")]
    InputTooLong {
        /// Token count of the submitted document.
        tokens: usize,
        /// Token ceiling of the model.
        limit: usize,
        /// Model identifier.
        model: String,
    },
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Every chunk failed to summarize.
    #[error("Summarization failed: {0}")]
    SummarizationFailed(String),
}

/// Unit used to size chunk windows. A single request never mixes the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnit {
    /// Whitespace-delimited words.
    Words,
    /// Byte-level BPE sub-word tokens.
    Tokens,
}

/// Output-length budget handed to a summarizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SummaryBudget {
    /// Upper bound on generated length, in model tokens.
    pub max_length: usize,
    /// Lower bound on generated length, in model tokens.
    pub min_length: usize,
}

/// Tunables for a single pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Character cap applied by the validator; `None` disables truncation.
    pub max_input_chars: Option<usize>,
    /// Unit used for chunk windows.
    pub chunk_unit: ChunkUnit,
    /// Explicit window size; derived from the model profile when unset.
    pub chunk_size: Option<usize>,
    /// Units shared between consecutive windows.
    pub chunk_overlap: usize,
    /// Joined summaries longer than this many characters get a second pass.
    pub resummarize_threshold: usize,
    /// Budget for each chunk.
    pub chunk_budget: SummaryBudget,
    /// Budget for the second pass.
    pub final_budget: SummaryBudget,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_input_chars: Some(10_000),
            chunk_unit: ChunkUnit::Tokens,
            chunk_size: None,
            chunk_overlap: 50,
            resummarize_threshold: 1000,
            chunk_budget: SummaryBudget {
                max_length: 130,
                min_length: 30,
            },
            final_budget: SummaryBudget {
                max_length: 250,
                min_length: 60,
            },
        }
    }
}

/// Result of a completed summarization request.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    /// Final summary text.
    pub summary: String,
    /// Identifier of the summarizer that produced it.
    pub model: String,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Chunks skipped because summarization failed.
    pub chunks_failed: usize,
    /// Length of the submitted text in characters, before truncation.
    pub original_length: usize,
    /// Length of the final summary in characters.
    pub summary_length: usize,
    /// Whether the validator truncated the input.
    pub truncated: bool,
    /// Whether the joined partial summaries were summarized a second time.
    pub resummarized: bool,
    /// Wall-clock time spent in the pipeline.
    pub elapsed: Duration,
}
