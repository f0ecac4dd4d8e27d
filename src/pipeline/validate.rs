//! Request text validation and character-budget truncation.

use super::types::PipelineError;

const MISSING_TEXT: &str = "No text provided";

/// Text accepted by the validator, ready for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Document {
    pub(crate) text: String,
    pub(crate) original_length: usize,
    pub(crate) truncated: bool,
}

/// Reject missing or blank text and cut overlong input down to `max_chars` characters.
pub(crate) fn validate_text(
    text: Option<String>,
    max_chars: Option<usize>,
) -> Result<Document, PipelineError> {
    let text = text.ok_or_else(|| PipelineError::InvalidInput(MISSING_TEXT.into()))?;
    if text.trim().is_empty() {
        return Err(PipelineError::InvalidInput(MISSING_TEXT.into()));
    }

    let original_length = text.chars().count();
    match max_chars {
        Some(limit) if original_length > limit => {
            let truncated = truncate_chars(&text, limit).to_string();
            tracing::warn!(
                original_length,
                truncated_length = limit,
                "Input exceeded character budget; truncating"
            );
            Ok(Document {
                text: truncated,
                original_length,
                truncated: true,
            })
        }
        _ => Ok(Document {
            text,
            original_length,
            truncated: false,
        }),
    }
}

/// Borrow the first `max_chars` characters of `text`, never splitting a code point.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
