//! Reassembly of per-chunk summaries into the final summary.

use super::types::SummaryBudget;
use super::validate::truncate_chars;
use crate::summarization::Summarizer;

const ELLIPSIS: &str = "...";

/// Final summary plus whether a second pass produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CombinedSummary {
    pub(crate) text: String,
    pub(crate) resummarized: bool,
}

/// Join partial summaries in chunk order and condense the join once if it is still too long.
///
/// When the second pass fails the join is cut to `threshold` characters and marked with `...`.
pub(crate) async fn combine_partials(
    partials: &[String],
    threshold: usize,
    budget: SummaryBudget,
    summarizer: &dyn Summarizer,
) -> CombinedSummary {
    let joined = partials.join(" ");
    let joined_length = joined.chars().count();
    if joined_length <= threshold {
        return CombinedSummary {
            text: joined,
            resummarized: false,
        };
    }

    tracing::info!(
        joined_length,
        threshold,
        partials = partials.len(),
        "Combined summary over threshold; summarizing again"
    );
    match summarizer.summarize(&joined, budget).await {
        Ok(text) => CombinedSummary {
            text,
            resummarized: true,
        },
        Err(error) => {
            tracing::warn!(error = %error, "Second summarization pass failed; truncating");
            let mut text = truncate_chars(&joined, threshold).trim_end().to_string();
            text.push_str(ELLIPSIS);
            CombinedSummary {
                text,
                resummarized: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::{ModelProfile, SummarizerError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSummarizer {
        calls: AtomicUsize,
        fail: bool,
        profile: ModelProfile,
    }

    impl CountingSummarizer {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
                profile: ModelProfile::for_model("facebook/bart-large-cnn"),
            }
        }
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        fn model_id(&self) -> &str {
            &self.profile.model_id
        }

        fn profile(&self) -> &ModelProfile {
            &self.profile
        }

        async fn summarize(
            &self,
            _text: &str,
            budget: SummaryBudget,
        ) -> Result<String, SummarizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SummarizerError::GenerationFailed("boom".into()));
            }
            Ok(format!("condensed to {}", budget.max_length))
        }
    }

    const FINAL: SummaryBudget = SummaryBudget {
        max_length: 250,
        min_length: 60,
    };

    #[tokio::test]
    async fn short_join_is_returned_as_is() {
        let summarizer = CountingSummarizer::new(false);
        let partials = vec!["First part.".to_string(), "Second part.".to_string()];
        let combined = combine_partials(&partials, 100, FINAL, &summarizer).await;

        assert_eq!(combined.text, "First part. Second part.");
        assert!(!combined.resummarized);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_join_triggers_exactly_one_more_pass() {
        let summarizer = CountingSummarizer::new(false);
        let partials = vec!["a".repeat(60), "b".repeat(60)];
        let combined = combine_partials(&partials, 100, FINAL, &summarizer).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(combined.text, "condensed to 250");
        assert!(combined.resummarized);
    }

    #[tokio::test]
    async fn failed_second_pass_truncates_with_ellipsis() {
        let summarizer = CountingSummarizer::new(true);
        let partials = vec!["a".repeat(60), "b".repeat(60)];
        let combined = combine_partials(&partials, 100, FINAL, &summarizer).await;

        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
        assert!(combined.text.ends_with("..."));
        assert_eq!(combined.text.chars().count(), 103);
        assert!(combined.text.starts_with(&"a".repeat(60)));
        assert!(!combined.resummarized);
    }

    #[tokio::test]
    async fn join_at_threshold_is_not_resummarized() {
        let summarizer = CountingSummarizer::new(false);
        let partials = vec!["x".repeat(50), "y".repeat(49)];
        let combined = combine_partials(&partials, 100, FINAL, &summarizer).await;

        assert_eq!(combined.text.chars().count(), 100);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }
}
