//! Summary service coordinating validation, chunking, summarization, and recombination.

use crate::{
    config::Config,
    metrics::{MetricsSnapshot, SummaryMetrics},
    pipeline::{
        chunking::{BpeTokenizer, chunk_document, determine_chunk_size},
        combine::combine_partials,
        types::{ChunkingError, PipelineError, PipelineSettings, SummaryOutcome},
        validate::validate_text,
    },
    summarization::{Summarizer, load_summarizer},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Runs the summarization pipeline for each request.
///
/// The service owns the summarizer chosen at startup, the shared tokenizer, and the metrics
/// registry. Construct it once near process start and share it through an `Arc`; requests only
/// read from it.
pub struct SummaryService {
    summarizer: Box<dyn Summarizer>,
    tokenizer: BpeTokenizer,
    settings: PipelineSettings,
    metrics: Arc<SummaryMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Validate, chunk, and summarize the submitted text.
    async fn summarize_text(&self, text: Option<String>) -> Result<SummaryOutcome, PipelineError>;

    /// Identifier of the active summarizer.
    fn model_id(&self) -> &str;

    /// Whether a pre-trained model (rather than the extractive fallback) is serving requests.
    fn model_loaded(&self) -> bool;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummaryService {
    /// Load the tokenizer and pick a summarizer according to `config`.
    pub async fn new(config: &Config) -> Result<Self, ChunkingError> {
        tracing::info!("Loading tokenizer");
        let tokenizer = BpeTokenizer::load()?;
        let summarizer = load_summarizer(config, &tokenizer).await;
        tracing::info!(
            model = summarizer.model_id(),
            model_backed = summarizer.is_model_backed(),
            "Summarizer initialized"
        );
        Ok(Self::with_summarizer(
            summarizer,
            tokenizer,
            config.pipeline_settings(),
        ))
    }

    /// Assemble a service around an already selected summarizer.
    pub fn with_summarizer(
        summarizer: Box<dyn Summarizer>,
        tokenizer: BpeTokenizer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            summarizer,
            tokenizer,
            settings,
            metrics: Arc::new(SummaryMetrics::new()),
        }
    }

    /// Summarize a document.
    pub async fn summarize_text(
        &self,
        text: Option<String>,
    ) -> Result<SummaryOutcome, PipelineError> {
        let started = Instant::now();
        let profile = self.summarizer.profile();

        // Measured on the submitted text; the character cap must not hide an oversized document.
        if let (true, Some(raw)) = (profile.rejects_overlong_input, text.as_deref()) {
            let tokens = self.tokenizer.count(raw);
            if tokens > profile.max_input_tokens {
                self.metrics.record_failure(0);
                return Err(PipelineError::InputTooLong {
                    tokens,
                    limit: profile.max_input_tokens,
                    model: profile.model_id.clone(),
                });
            }
        }

        let document = validate_text(text, self.settings.max_input_chars)?;
        let chunk_size = determine_chunk_size(self.settings.chunk_size, profile.max_input_tokens);
        let overlap = self.effective_overlap(chunk_size);
        let chunks = chunk_document(
            &document.text,
            self.settings.chunk_unit,
            chunk_size,
            overlap,
            &self.tokenizer,
        )
        .inspect_err(|_| self.metrics.record_failure(0))?;
        tracing::debug!(
            chunks = chunks.len(),
            chunk_size,
            overlap,
            unit = ?self.settings.chunk_unit,
            "Document chunked"
        );

        let mut partials = Vec::with_capacity(chunks.len());
        let mut failed = 0usize;
        for (index, chunk) in chunks.iter().enumerate() {
            match self
                .summarizer
                .summarize(chunk, self.settings.chunk_budget)
                .await
            {
                Ok(summary) if !summary.trim().is_empty() => partials.push(summary),
                Ok(_) => {
                    failed += 1;
                    tracing::warn!(chunk = index, "Chunk produced an empty summary; skipping");
                }
                Err(error) => {
                    failed += 1;
                    tracing::warn!(chunk = index, error = %error, "Chunk summarization failed; skipping");
                }
            }
        }

        if partials.is_empty() {
            self.metrics.record_failure(failed as u64);
            tracing::error!(chunks = chunks.len(), "Every chunk failed to summarize");
            return Err(PipelineError::SummarizationFailed(format!(
                "all {} chunks failed to summarize",
                chunks.len()
            )));
        }

        let combined = combine_partials(
            &partials,
            self.settings.resummarize_threshold,
            self.settings.final_budget,
            self.summarizer.as_ref(),
        )
        .await;

        self.metrics.record_summary(
            partials.len() as u64,
            failed as u64,
            combined.resummarized,
        );

        let outcome = SummaryOutcome {
            summary_length: combined.text.chars().count(),
            summary: combined.text,
            model: self.summarizer.model_id().to_string(),
            chunk_count: chunks.len(),
            chunks_failed: failed,
            original_length: document.original_length,
            truncated: document.truncated,
            resummarized: combined.resummarized,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            model = %outcome.model,
            chunks = outcome.chunk_count,
            chunks_failed = outcome.chunks_failed,
            original_length = outcome.original_length,
            summary_length = outcome.summary_length,
            resummarized = outcome.resummarized,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Document summarized"
        );
        Ok(outcome)
    }

    fn effective_overlap(&self, chunk_size: usize) -> usize {
        let requested = self.settings.chunk_overlap;
        let overlap = requested.min(chunk_size.saturating_sub(1));
        if overlap < requested {
            tracing::debug!(requested, overlap, chunk_size, "Clamped chunk overlap");
        }
        overlap
    }

    /// Identifier of the active summarizer.
    pub fn model_id(&self) -> &str {
        self.summarizer.model_id()
    }
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize_text(&self, text: Option<String>) -> Result<SummaryOutcome, PipelineError> {
        SummaryService::summarize_text(self, text).await
    }

    fn model_id(&self) -> &str {
        SummaryService::model_id(self)
    }

    fn model_loaded(&self) -> bool {
        self.summarizer.is_model_backed()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ChunkUnit, SummaryBudget};
    use crate::summarization::{ExtractiveSummarizer, ModelProfile, SummarizerError};

    /// Echoes the first word of each chunk; chunks containing `FAIL` error out.
    struct ScriptedSummarizer {
        profile: ModelProfile,
    }

    impl ScriptedSummarizer {
        fn new(profile: ModelProfile) -> Self {
            Self { profile }
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        fn model_id(&self) -> &str {
            &self.profile.model_id
        }

        fn profile(&self) -> &ModelProfile {
            &self.profile
        }

        async fn summarize(
            &self,
            text: &str,
            _budget: SummaryBudget,
        ) -> Result<String, SummarizerError> {
            if text.contains("FAIL") {
                return Err(SummarizerError::GenerationFailed("scripted".into()));
            }
            let first = text.split_whitespace().next().unwrap_or_default();
            Ok(format!("<{first}>"))
        }
    }

    fn word_settings(chunk_size: usize, overlap: usize) -> PipelineSettings {
        PipelineSettings {
            chunk_unit: ChunkUnit::Words,
            chunk_size: Some(chunk_size),
            chunk_overlap: overlap,
            ..PipelineSettings::default()
        }
    }

    fn service(summarizer: impl Summarizer + 'static, settings: PipelineSettings) -> SummaryService {
        SummaryService::with_summarizer(
            Box::new(summarizer),
            BpeTokenizer::load().expect("tokenizer"),
            settings,
        )
    }

    #[tokio::test]
    async fn partial_summaries_keep_chunk_order_when_a_chunk_fails() {
        let summarizer = ScriptedSummarizer::new(ModelProfile::for_model("facebook/bart-large-cnn"));
        let service = service(summarizer, word_settings(3, 0));

        let outcome = service
            .summarize_text(Some("alpha a a FAIL b b gamma c c delta".into()))
            .await
            .expect("summary");

        assert_eq!(outcome.summary, "<alpha> <gamma> <delta>");
        assert_eq!(outcome.chunk_count, 4);
        assert_eq!(outcome.chunks_failed, 1);
        assert!(!outcome.resummarized);
        assert_eq!(outcome.model, "facebook/bart-large-cnn");

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.requests_summarized, 1);
        assert_eq!(snapshot.chunks_summarized, 3);
        assert_eq!(snapshot.chunk_failures, 1);
    }

    #[tokio::test]
    async fn every_chunk_failing_is_a_summarization_failure() {
        let summarizer = ScriptedSummarizer::new(ModelProfile::for_model("t5-small"));
        let service = service(summarizer, word_settings(2, 0));

        let error = service
            .summarize_text(Some("FAIL one FAIL two".into()))
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::SummarizationFailed(_)));
        assert_eq!(service.metrics_snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn chunks_overlap_by_configured_units() {
        let summarizer = ScriptedSummarizer::new(ModelProfile::for_model("facebook/bart-large-cnn"));
        let service = service(summarizer, word_settings(4, 2));

        let outcome = service
            .summarize_text(Some("w0 w1 w2 w3 w4 w5 w6 w7".into()))
            .await
            .expect("summary");
        assert_eq!(outcome.summary, "<w0> <w2> <w4>");
        assert_eq!(outcome.chunk_count, 3);
    }

    #[tokio::test]
    async fn missing_text_is_rejected_before_summarizing() {
        let summarizer = ScriptedSummarizer::new(ModelProfile::for_model("facebook/bart-large-cnn"));
        let service = service(summarizer, PipelineSettings::default());

        let error = service.summarize_text(None).await.unwrap_err();
        assert!(matches!(error, PipelineError::InvalidInput(_)));
        let error = service.summarize_text(Some("   ".into())).await.unwrap_err();
        assert!(matches!(error, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn overlong_input_is_rejected_for_ceiling_enforcing_models() {
        let profile = ModelProfile {
            max_input_tokens: 8,
            ..ModelProfile::for_model("allenai/led-base-16384")
        };
        let service = service(ScriptedSummarizer::new(profile), PipelineSettings::default());

        let error = service
            .summarize_text(Some("one two three four five six seven eight nine ten".into()))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            PipelineError::InputTooLong { tokens: 10, limit: 8, .. }
        ));
    }

    #[tokio::test]
    async fn ceiling_is_enforced_before_the_character_cap() {
        let profile = ModelProfile::for_model("allenai/led-large-16384-arxiv");
        let service = service(ScriptedSummarizer::new(profile), PipelineSettings::default());

        let error = service
            .summarize_text(Some("word ".repeat(40_000)))
            .await
            .unwrap_err();
        match error {
            PipelineError::InputTooLong { tokens, limit, .. } => {
                assert_eq!(limit, 16_384);
                assert!(tokens > limit);
            }
            other => panic!("expected InputTooLong, got {other:?}"),
        }
        assert_eq!(service.metrics_snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn overlong_input_is_truncated_and_reported() {
        let summarizer = ScriptedSummarizer::new(ModelProfile::for_model("facebook/bart-large-cnn"));
        let settings = PipelineSettings {
            max_input_chars: Some(11),
            ..word_settings(10, 0)
        };
        let service = service(summarizer, settings);

        let outcome = service
            .summarize_text(Some("hello world and everything after".into()))
            .await
            .expect("summary");
        assert!(outcome.truncated);
        assert_eq!(outcome.original_length, 32);
        assert_eq!(outcome.summary, "<hello>");
    }

    #[tokio::test]
    async fn extractive_fallback_runs_end_to_end() {
        let settings = PipelineSettings {
            chunk_unit: ChunkUnit::Words,
            ..PipelineSettings::default()
        };
        let service = service(ExtractiveSummarizer::new(2, 30), settings);

        let outcome = service
            .summarize_text(Some(
                "A short one. This is a much longer sentence that should score higher. Tiny. \
                 Another long informative sentence goes here."
                    .into(),
            ))
            .await
            .expect("summary");
        assert_eq!(outcome.model, "extractive");
        assert_eq!(outcome.chunk_count, 1);
        assert_eq!(
            outcome.summary,
            "This is a much longer sentence that should score higher. \
             Another long informative sentence goes here"
        );
        assert!(!service.model_loaded());
    }
}
