//! Ollama-backed summarizer.
//!
//! Ollama serves general chat models, so the length budget travels inside the prompt and as a
//! `num_predict` cap rather than as generation parameters.

use super::{ModelProfile, Summarizer, SummarizerError};
use crate::pipeline::{BpeTokenizer, SummaryBudget};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Summarizer backed by a local Ollama runtime.
pub struct OllamaSummarizer {
    http: Client,
    base_url: String,
    profile: ModelProfile,
    tokenizer: BpeTokenizer,
}

impl OllamaSummarizer {
    /// Build a client for a single Ollama model.
    pub fn new(
        http: Client,
        base_url: String,
        profile: ModelProfile,
        tokenizer: BpeTokenizer,
    ) -> Self {
        Self {
            http,
            base_url,
            profile,
            tokenizer,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }

    fn build_prompt(&self, text: &str, budget: SummaryBudget) -> String {
        let max_words = (budget.max_length * 3 / 4).max(1);
        let min_words = (budget.min_length * 3 / 4).min(max_words);
        let body = self
            .tokenizer
            .truncate(text.trim(), self.profile.max_input_tokens);
        format!(
            "Summarize the following text in {min_words} to {max_words} words. \
             Respond with the summary only, as a single paragraph.\n\n{body}"
        )
    }
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaSummarizer {
    /// POST `body` to `/api/{path}` and sort failures into the summarizer error kinds.
    async fn call(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, SummarizerError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|error| SummarizerError::ProviderUnavailable(format!("{url}: {error}")))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(SummarizerError::ProviderUnavailable(format!(
                "model {} is not installed in Ollama",
                self.profile.model_id
            ))),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(SummarizerError::GenerationFailed(format!(
                    "{} answered {status} for {}: {detail}",
                    url, self.profile.model_id
                )))
            }
        }
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn model_id(&self) -> &str {
        &self.profile.model_id
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    async fn warm_up(&self) -> Result<(), SummarizerError> {
        self.call("show", json!({ "model": self.profile.model_id }))
            .await
            .map(drop)
            .map_err(|error| match error {
                SummarizerError::GenerationFailed(detail) => {
                    SummarizerError::ProviderUnavailable(detail)
                }
                other => other,
            })
    }

    async fn summarize(
        &self,
        text: &str,
        budget: SummaryBudget,
    ) -> Result<String, SummarizerError> {
        let request = json!({
            "model": self.profile.model_id,
            "prompt": self.build_prompt(text, budget),
            "stream": false,
            "options": {
                "temperature": 0.0,
                "num_predict": budget.max_length * 2,
            }
        });

        let reply: GenerateReply = self
            .call("generate", request)
            .await?
            .json()
            .await
            .map_err(|error| SummarizerError::InvalidResponse(error.to_string()))?;

        let summary = reply.response.trim();
        match (reply.done, summary.is_empty()) {
            (false, _) => Err(SummarizerError::InvalidResponse(
                "generation stopped before completion".into(),
            )),
            (true, true) => Err(SummarizerError::InvalidResponse("empty summary".into())),
            (true, false) => Ok(summary.to_string()),
        }
    }
}
