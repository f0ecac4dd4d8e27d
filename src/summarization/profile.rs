//! Static knowledge about the sequence-to-sequence models EchoBreak can front.

/// Model families with distinct input limits or prompt conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelFamily {
    /// `facebook/bart-*`.
    Bart,
    /// `sshleifer/distilbart-*`.
    DistilBart,
    /// `t5-*` and `google/t5-*`; expects a task prefix.
    T5,
    /// Longformer Encoder-Decoder (`allenai/led-*`).
    Led,
    /// Anything else, including general-purpose Ollama models.
    Generic,
}

/// Limits and conventions for a loaded model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelProfile {
    /// Identifier passed to the model host.
    pub model_id: String,
    /// Family the identifier resolved to.
    pub family: ModelFamily,
    /// Absolute input ceiling in tokens.
    pub max_input_tokens: usize,
    /// Reject documents above the ceiling instead of chunking them.
    pub rejects_overlong_input: bool,
}

impl ModelProfile {
    /// Resolve a profile from a model identifier.
    pub fn for_model(model_id: &str) -> Self {
        let normalized = model_id.to_lowercase();
        let (family, max_input_tokens) = if normalized.contains("distilbart") {
            (ModelFamily::DistilBart, 1024)
        } else if normalized.contains("bart") {
            (ModelFamily::Bart, 1024)
        } else if normalized.starts_with("led-") || normalized.contains("/led-") {
            (ModelFamily::Led, 16_384)
        } else if normalized.contains("t5") {
            (ModelFamily::T5, 512)
        } else {
            tracing::trace!(model = model_id, "Using generic model profile");
            (ModelFamily::Generic, 4096)
        };

        Self {
            model_id: model_id.to_string(),
            family,
            max_input_tokens,
            rejects_overlong_input: family == ModelFamily::Led,
        }
    }

    /// Profile used by the extractive fallback, which has no model ceiling of its own.
    pub fn extractive() -> Self {
        Self {
            model_id: "extractive".to_string(),
            family: ModelFamily::Generic,
            max_input_tokens: 1024,
            rejects_overlong_input: false,
        }
    }

    /// Task prefix prepended to model input.
    pub fn input_prefix(&self) -> &'static str {
        match self.family {
            ModelFamily::T5 => "summarize: ",
            _ => "",
        }
    }
}
