//! Summarizer adapters and startup model selection.
//!
//! Every backend implements [`Summarizer`]. At startup the configured model identifiers are tried
//! in order and the first one that answers a warm-up request becomes the service's summarizer.
//! When none answers, or the backend is set to `extractive`, the deterministic extractive
//! heuristic takes over so the service still returns something useful.

mod extractive;
mod huggingface;
mod ollama;
pub mod profile;

pub use extractive::{ExtractiveSummarizer, extract_sentences};
pub use huggingface::HuggingFaceSummarizer;
pub use ollama::OllamaSummarizer;
pub use profile::{ModelFamily, ModelProfile};

use crate::config::{Config, SummarizerBackend};
use crate::pipeline::{BpeTokenizer, SummaryBudget};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "echobreak/summary";

/// Errors surfaced while attempting to summarize text.
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// Model host was unreachable or the model is not loaded.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Model host returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Model host response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Capability shared by model-backed and extractive summarizers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Identifier reported in responses and health checks.
    fn model_id(&self) -> &str;

    /// Input limits for the underlying model.
    fn profile(&self) -> &ModelProfile;

    /// Whether summaries come from a pre-trained model rather than the extractive heuristic.
    fn is_model_backed(&self) -> bool {
        true
    }

    /// Confirm the backend can serve requests.
    async fn warm_up(&self) -> Result<(), SummarizerError> {
        Ok(())
    }

    /// Produce a summary of `text` within `budget`.
    async fn summarize(&self, text: &str, budget: SummaryBudget)
    -> Result<String, SummarizerError>;
}

/// Pick the summarizer for this process.
///
/// Model-backed candidates are built from `SUMMARIZER_MODELS` and warmed up one at a time; the
/// first success wins. The extractive heuristic is returned when every candidate fails.
pub async fn load_summarizer(config: &Config, tokenizer: &BpeTokenizer) -> Box<dyn Summarizer> {
    if config.summarizer_backend == SummarizerBackend::Extractive {
        tracing::info!("Extractive backend configured; skipping model loading");
        return Box::new(extractive_from_config(config));
    }

    let mut candidates: Vec<Box<dyn Summarizer>> = Vec::new();
    for model in &config.summarizer_models {
        match build_model_client(config, model, tokenizer) {
            Ok(candidate) => candidates.push(candidate),
            Err(error) => {
                tracing::warn!(model = %model, error = %error, "Failed to construct model client");
            }
        }
    }

    match first_ready(candidates).await {
        Some(summarizer) => summarizer,
        None => {
            tracing::warn!(
                backend = ?config.summarizer_backend,
                "No summarization model could be loaded; using extractive fallback"
            );
            Box::new(extractive_from_config(config))
        }
    }
}

/// Warm up candidates in order and return the first that succeeds.
pub async fn first_ready(candidates: Vec<Box<dyn Summarizer>>) -> Option<Box<dyn Summarizer>> {
    for candidate in candidates {
        tracing::info!(model = candidate.model_id(), "Loading summarization model");
        match candidate.warm_up().await {
            Ok(()) => {
                tracing::info!(model = candidate.model_id(), "Summarization model ready");
                return Some(candidate);
            }
            Err(error) => {
                tracing::warn!(
                    model = candidate.model_id(),
                    error = %error,
                    "Summarization model failed to load; trying next"
                );
            }
        }
    }
    None
}

fn build_model_client(
    config: &Config,
    model: &str,
    tokenizer: &BpeTokenizer,
) -> Result<Box<dyn Summarizer>, SummarizerError> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.model_request_timeout_secs))
        .build()
        .map_err(|error| SummarizerError::ProviderUnavailable(error.to_string()))?;

    Ok(match config.summarizer_backend {
        SummarizerBackend::HuggingFace => Box::new(HuggingFaceSummarizer::new(
            http,
            config.hf_api_url.clone(),
            config.hf_api_token.clone(),
            ModelProfile::for_model(model),
            tokenizer.clone(),
        )),
        SummarizerBackend::Ollama => Box::new(OllamaSummarizer::new(
            http,
            config.ollama_url.clone(),
            ModelProfile::for_model(model),
            tokenizer.clone(),
        )),
        SummarizerBackend::Extractive => Box::new(extractive_from_config(config)),
    })
}

fn extractive_from_config(config: &Config) -> ExtractiveSummarizer {
    ExtractiveSummarizer::new(
        config.extractive_max_sentences,
        config.extractive_min_sentence_chars,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn hf_config(base_url: String, models: &[&str]) -> Config {
        Config {
            summarizer_backend: SummarizerBackend::HuggingFace,
            summarizer_models: models.iter().map(|model| model.to_string()).collect(),
            hf_api_url: base_url,
            model_request_timeout_secs: 5,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn extractive_backend_skips_model_loading() {
        let config = Config {
            summarizer_backend: SummarizerBackend::Extractive,
            ..Config::default()
        };
        let tokenizer = BpeTokenizer::load().expect("tokenizer");
        let summarizer = load_summarizer(&config, &tokenizer).await;
        assert_eq!(summarizer.model_id(), "extractive");
        assert!(!summarizer.is_model_backed());
    }

    #[tokio::test]
    async fn loading_falls_through_to_first_working_model() {
        let server = MockServer::start_async().await;
        let broken = server
            .mock_async(|when, then| {
                when.method(POST).path("/models/facebook/bart-large-cnn");
                then.status(503)
                    .json_body(json!({ "error": "Model is currently loading" }));
            })
            .await;
        let working = server
            .mock_async(|when, then| {
                when.method(POST).path("/models/sshleifer/distilbart-cnn-12-6");
                then.status(200)
                    .json_body(json!([{ "summary_text": "ok" }]));
            })
            .await;

        let config = hf_config(
            server.base_url(),
            &["facebook/bart-large-cnn", "sshleifer/distilbart-cnn-12-6"],
        );
        let tokenizer = BpeTokenizer::load().expect("tokenizer");
        let summarizer = load_summarizer(&config, &tokenizer).await;

        broken.assert_async().await;
        working.assert_async().await;
        assert_eq!(summarizer.model_id(), "sshleifer/distilbart-cnn-12-6");
        assert!(summarizer.is_model_backed());
    }

    #[tokio::test]
    async fn loading_uses_extractive_when_every_model_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500).body("boom");
            })
            .await;

        let config = hf_config(server.base_url(), &["facebook/bart-large-cnn", "t5-small"]);
        let tokenizer = BpeTokenizer::load().expect("tokenizer");
        let summarizer = load_summarizer(&config, &tokenizer).await;
        assert_eq!(summarizer.model_id(), "extractive");
    }
}
