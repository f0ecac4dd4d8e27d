#![deny(missing_docs)]

//! Core library for the EchoBreak summarization service.

/// HTTP routing and JSON handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization counters.
pub mod metrics;
/// Validation, chunking, and recombination pipeline.
pub mod pipeline;
/// Summarizer adapters and model loading.
pub mod summarization;
