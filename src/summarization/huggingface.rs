//! Client for hosts speaking the Hugging Face inference protocol.

use super::{ModelProfile, Summarizer, SummarizerError};
use crate::pipeline::{BpeTokenizer, SummaryBudget};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

const WARM_UP_TEXT: &str = "EchoBreak is starting up and checking that the summarization model \
    answers requests. This short paragraph exists only to confirm the model is loaded.";

/// Summarizer speaking the Hugging Face inference protocol.
///
/// Works against the hosted Inference API as well as self-hosted servers exposing
/// `POST /models/{model}` for the `summarization` task. Generation is greedy (`do_sample: false`),
/// so identical inputs produce identical summaries.
pub struct HuggingFaceSummarizer {
    http: Client,
    base_url: String,
    api_token: Option<String>,
    profile: ModelProfile,
    tokenizer: BpeTokenizer,
}

impl HuggingFaceSummarizer {
    /// Build a client for a single model on the given inference host.
    pub fn new(
        http: Client,
        base_url: String,
        api_token: Option<String>,
        profile: ModelProfile,
        tokenizer: BpeTokenizer,
    ) -> Self {
        Self {
            http,
            base_url,
            api_token,
            profile,
            tokenizer,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            self.profile.model_id
        )
    }

    /// Apply the task prefix and cut the input to the model's token ceiling.
    fn prepare_input(&self, text: &str) -> String {
        let prefix = self.profile.input_prefix();
        let limit = self
            .profile
            .max_input_tokens
            .saturating_sub(self.tokenizer.count(prefix));
        let body = self.tokenizer.truncate(text, limit);
        if body.len() < text.len() {
            tracing::debug!(
                model = %self.profile.model_id,
                limit,
                "Chunk exceeded model token ceiling; truncated before request"
            );
        }
        format!("{prefix}{body}")
    }
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    fn model_id(&self) -> &str {
        &self.profile.model_id
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    async fn warm_up(&self) -> Result<(), SummarizerError> {
        self.summarize(
            WARM_UP_TEXT,
            SummaryBudget {
                max_length: 20,
                min_length: 5,
            },
        )
        .await
        .map(|_| ())
    }

    async fn summarize(
        &self,
        text: &str,
        budget: SummaryBudget,
    ) -> Result<String, SummarizerError> {
        let payload = json!({
            "inputs": self.prepare_input(text),
            "parameters": {
                "max_length": budget.max_length,
                "min_length": budget.min_length.min(budget.max_length),
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            SummarizerError::ProviderUnavailable(format!(
                "failed to reach inference host at {}: {error}",
                self.base_url
            ))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::ProviderUnavailable(format!(
                "{} returned {status}: {body}",
                self.endpoint()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizerError::GenerationFailed(format!(
                "inference host returned {status}: {body}"
            )));
        }

        let items: Vec<SummaryItem> = response.json().await.map_err(|error| {
            SummarizerError::InvalidResponse(format!(
                "failed to decode summarization response: {error}"
            ))
        })?;

        let summary = items
            .into_iter()
            .next()
            .map(|item| item.summary_text.trim().to_string())
            .ok_or_else(|| {
                SummarizerError::InvalidResponse("response contained no summaries".into())
            })?;

        if summary.is_empty() {
            return Err(SummarizerError::InvalidResponse(
                "model returned an empty summary".into(),
            ));
        }

        Ok(summary)
    }
}
