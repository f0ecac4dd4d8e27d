//! Extractive fallback used when no pre-trained model can be loaded.
//!
//! Sentences are scored by length with a bonus for appearing early, and the best few are
//! returned in document order.

use super::{ModelProfile, Summarizer, SummarizerError};
use crate::pipeline::SummaryBudget;
use async_trait::async_trait;

const FALLBACK_CHARS: usize = 200;

/// Deterministic sentence-extraction summarizer used when no model is available.
pub struct ExtractiveSummarizer {
    max_sentences: usize,
    min_sentence_chars: usize,
    profile: ModelProfile,
}

impl ExtractiveSummarizer {
    /// Keep at most `max_sentences` sentences of at least `min_sentence_chars` characters.
    pub fn new(max_sentences: usize, min_sentence_chars: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
            min_sentence_chars,
            profile: ModelProfile::extractive(),
        }
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn model_id(&self) -> &str {
        &self.profile.model_id
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    fn is_model_backed(&self) -> bool {
        false
    }

    async fn summarize(
        &self,
        text: &str,
        _budget: SummaryBudget,
    ) -> Result<String, SummarizerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SummarizerError::GenerationFailed(
                "no text to summarize".into(),
            ));
        }

        let summary = extract_sentences(trimmed, self.max_sentences, self.min_sentence_chars);
        if summary.is_empty() {
            tracing::debug!("No sentence met the minimum length; returning leading text");
            return Ok(leading_chars(trimmed, FALLBACK_CHARS));
        }
        Ok(summary)
    }
}

/// Pick the highest-scoring sentences and return them in document order, joined by `". "`.
///
/// Sentences are split on `.`, `!`, and `?`; fragments shorter than `min_chars` are dropped. The
/// `i`-th remaining sentence scores `len × (1 + 1/√(i+1))`, so long sentences near the top win.
/// Equal scores keep the earlier sentence.
pub fn extract_sentences(text: &str, max_sentences: usize, min_chars: usize) -> String {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() >= min_chars)
        .collect();

    let mut ranked: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(position, sentence)| {
            let length = sentence.chars().count() as f64;
            let boost = 1.0 + 1.0 / ((position + 1) as f64).sqrt();
            (position, length * boost)
        })
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));

    let mut selected: Vec<usize> = ranked
        .into_iter()
        .take(max_sentences)
        .map(|(position, _)| position)
        .collect();
    selected.sort_unstable();

    selected
        .into_iter()
        .map(|position| sentences[position])
        .collect::<Vec<_>>()
        .join(". ")
}

fn leading_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", text[..byte_index].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: SummaryBudget = SummaryBudget {
        max_length: 130,
        min_length: 30,
    };

    #[test]
    fn keeps_long_sentences_in_document_order() {
        let text = "A short one. This is a much longer sentence that should score higher. Tiny. \
                    Another long informative sentence goes here.";
        let summary = extract_sentences(text, 2, 30);
        assert_eq!(
            summary,
            "This is a much longer sentence that should score higher. \
             Another long informative sentence goes here"
        );
    }

    #[test]
    fn early_sentences_outrank_similar_later_ones() {
        let first = "First sentence has exactly the same length as others";
        let second = "Other sentence has exactly the same length as first";
        let third = "Third sentence has exactly the same length as first";
        let text = format!("{first}. {second}. {third}.");
        assert_eq!(extract_sentences(&text, 1, 30), first);
        assert_eq!(extract_sentences(&text, 2, 30), format!("{first}. {second}"));
    }

    #[test]
    fn selection_restores_original_order() {
        let text = "This opening sentence is of moderate length overall! \
                    Then a considerably longer sentence appears with far more words inside it? \
                    And a closing line that is the longest of them all by quite a wide margin indeed.";
        let summary = extract_sentences(text, 2, 30);
        assert!(summary.starts_with("Then a considerably longer sentence"));
        assert!(summary.ends_with("by quite a wide margin indeed"));
    }

    #[tokio::test]
    async fn short_fragments_fall_back_to_leading_text() {
        let summarizer = ExtractiveSummarizer::new(3, 30);
        let summary = summarizer.summarize("Hi. Ok. Yes.", BUDGET).await.unwrap();
        assert_eq!(summary, "Hi. Ok. Yes.");
    }

    #[tokio::test]
    async fn blank_input_is_an_error() {
        let summarizer = ExtractiveSummarizer::new(3, 30);
        assert!(summarizer.summarize("   ", BUDGET).await.is_err());
    }

    #[test]
    fn leading_chars_marks_cut_text() {
        let text = "x".repeat(300);
        let cut = leading_chars(&text, 200);
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));
    }
}
