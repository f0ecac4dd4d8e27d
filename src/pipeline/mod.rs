//! Summarization pipeline: validation, chunking, per-chunk summarization, and recombination.

pub mod chunking;
mod combine;
mod service;
pub mod types;
mod validate;

pub use chunking::BpeTokenizer;
pub use service::{SummaryApi, SummaryService};
pub use types::{
    ChunkUnit, ChunkingError, PipelineError, PipelineSettings, SummaryBudget, SummaryOutcome,
};
