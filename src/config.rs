use crate::pipeline::{ChunkUnit, PipelineSettings, SummaryBudget};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODELS: &str = "facebook/bart-large-cnn,sshleifer/distilbart-cnn-12-6,t5-small";
const DEFAULT_HF_API_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the EchoBreak server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on (host is always `0.0.0.0`).
    pub server_port: u16,
    /// Backend used to produce abstractive summaries.
    pub summarizer_backend: SummarizerBackend,
    /// Model identifiers tried in order at startup; the first that loads wins.
    pub summarizer_models: Vec<String>,
    /// Base URL of a Hugging Face compatible inference host.
    pub hf_api_url: String,
    /// Optional bearer token for the inference host.
    pub hf_api_token: Option<String>,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Per-call timeout applied to model requests.
    pub model_request_timeout_secs: u64,
    /// Character cap applied to incoming text; `None` disables truncation.
    pub max_input_chars: Option<usize>,
    /// Unit used to measure chunk windows.
    pub chunk_unit: ChunkUnit,
    /// Optional override for the automatic chunk size selection.
    pub chunk_size: Option<usize>,
    /// Units shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Joined partial summaries longer than this many characters are summarized again.
    pub resummarize_threshold: usize,
    /// Output budget for each chunk.
    pub chunk_budget: SummaryBudget,
    /// Output budget for the second pass over joined partial summaries.
    pub final_budget: SummaryBudget,
    /// Number of sentences kept by the extractive fallback.
    pub extractive_max_sentences: usize,
    /// Sentences shorter than this are ignored by the extractive fallback.
    pub extractive_min_sentence_chars: usize,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummarizerBackend {
    /// Hugging Face inference protocol (`POST /models/{model}`).
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
    /// Skip model loading and use the extractive heuristic.
    Extractive,
}

impl Default for Config {
    fn default() -> Self {
        let settings = PipelineSettings::default();
        Self {
            server_port: DEFAULT_PORT,
            summarizer_backend: SummarizerBackend::HuggingFace,
            summarizer_models: split_models(DEFAULT_MODELS),
            hf_api_url: DEFAULT_HF_API_URL.to_string(),
            hf_api_token: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model_request_timeout_secs: 60,
            max_input_chars: settings.max_input_chars,
            chunk_unit: settings.chunk_unit,
            chunk_size: None,
            chunk_overlap: settings.chunk_overlap,
            resummarize_threshold: settings.resummarize_threshold,
            chunk_budget: settings.chunk_budget,
            final_budget: settings.final_budget,
            extractive_max_sentences: 3,
            extractive_min_sentence_chars: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_port: parse_optional("PORT")?.unwrap_or(defaults.server_port),
            summarizer_backend: parse_optional("SUMMARIZER_BACKEND")?
                .unwrap_or(defaults.summarizer_backend),
            summarizer_models: load_env_optional("SUMMARIZER_MODELS")
                .map(|value| split_models(&value))
                .unwrap_or(defaults.summarizer_models),
            hf_api_url: load_env_optional("HF_API_URL").unwrap_or(defaults.hf_api_url),
            hf_api_token: load_env_optional("HF_API_TOKEN"),
            ollama_url: load_env_optional("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model_request_timeout_secs: parse_optional("MODEL_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.model_request_timeout_secs),
            max_input_chars: match parse_optional::<usize>("MAX_INPUT_CHARS")? {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => defaults.max_input_chars,
            },
            chunk_unit: parse_optional("CHUNK_UNIT")?.unwrap_or(defaults.chunk_unit),
            chunk_size: parse_optional("CHUNK_SIZE")?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?.unwrap_or(defaults.chunk_overlap),
            resummarize_threshold: parse_optional("RESUMMARIZE_THRESHOLD")?
                .unwrap_or(defaults.resummarize_threshold),
            chunk_budget: SummaryBudget {
                max_length: parse_optional("SUMMARY_MAX_LENGTH")?
                    .unwrap_or(defaults.chunk_budget.max_length),
                min_length: parse_optional("SUMMARY_MIN_LENGTH")?
                    .unwrap_or(defaults.chunk_budget.min_length),
            },
            final_budget: SummaryBudget {
                max_length: parse_optional("FINAL_MAX_LENGTH")?
                    .unwrap_or(defaults.final_budget.max_length),
                min_length: parse_optional("FINAL_MIN_LENGTH")?
                    .unwrap_or(defaults.final_budget.min_length),
            },
            extractive_max_sentences: parse_optional("EXTRACTIVE_MAX_SENTENCES")?
                .unwrap_or(defaults.extractive_max_sentences),
            extractive_min_sentence_chars: parse_optional("EXTRACTIVE_MIN_SENTENCE_CHARS")?
                .unwrap_or(defaults.extractive_min_sentence_chars),
        })
    }

    /// Project the pipeline-related settings out of the full configuration.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_input_chars: self.max_input_chars,
            chunk_unit: self.chunk_unit,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            resummarize_threshold: self.resummarize_threshold,
            chunk_budget: self.chunk_budget,
            final_budget: self.final_budget,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn split_models(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromStr for SummarizerBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            "extractive" | "none" => Ok(Self::Extractive),
            _ => Err(()),
        }
    }
}

impl FromStr for ChunkUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tokens" | "token" => Ok(Self::Tokens),
            "words" | "word" => Ok(Self::Words),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = config.server_port,
        backend = ?config.summarizer_backend,
        models = ?config.summarizer_models,
        chunk_unit = ?config.chunk_unit,
        chunk_size = ?config.chunk_size,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
