use std::path::PathBuf;
use std::time::Duration;

pub use interfaces::defs::{
    Artifact, ArtifactPayload, ErrorKind, InvocationRequest, InvocationResult, Modality,
    ModelSpec, Tier,
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_TEXT_MODEL: &str = "google/gemma-3-27b-it:free";
pub const DEFAULT_VISION_MODEL: &str = "google/gemma-3-27b-it:free";
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "google/gemma-3-12b-it:free",
    "nvidia/nemotron-nano-12b-v2-vl:free",
    "google/gemini-2.5-flash:free",
];

const API_KEY_PLACEHOLDER_PREFIX: &str = "sk-or-v1-xxx";

/// Settings consumed by the transport, registry and invocation layer.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub text_fallback_models: Vec<String>,
    pub vision_model: String,
    pub vision_fallback_models: Vec<String>,
    /// Attempts against a single model before falling back.
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub max_retry_delay: Duration,
    pub request_timeout: Duration,
    pub transient_statuses: Vec<u16>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let fallbacks: Vec<String> = DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
        Self {
            api_key: String::new(),
            base_url: OPENROUTER_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            text_fallback_models: fallbacks.clone(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vision_fallback_models: fallbacks,
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(5),
            max_retry_delay: Duration::from_secs(60),
            request_timeout: Duration::from_secs(120),
            transient_statuses: vec![429, 402, 503],
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay defaults with values from `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(key) = get("OPENROUTER_API_KEY") {
            config.api_key = key;
        }
        if let Some(url) = get("OPENROUTER_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = get("TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(list) = get("TEXT_FALLBACK_MODELS") {
            config.text_fallback_models = split_list(&list);
        }
        if let Some(model) = get("VISION_MODEL") {
            config.vision_model = model;
        }
        if let Some(list) = get("VISION_FALLBACK_MODELS") {
            config.vision_fallback_models = split_list(&list);
        }
        if let Some(value) = get("MAX_RETRIES") {
            config.max_attempts = parse_value("MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("RETRY_DELAY") {
            config.retry_base_delay = parse_seconds("RETRY_DELAY", &value)?;
        }
        if let Some(value) = get("MAX_RETRY_DELAY") {
            config.max_retry_delay = parse_seconds("MAX_RETRY_DELAY", &value)?;
        }
        if let Some(value) = get("REQUEST_TIMEOUT") {
            config.request_timeout = parse_seconds("REQUEST_TIMEOUT", &value)?;
        }
        if let Some(list) = get("TRANSIENT_STATUS_CODES") {
            config.transient_statuses = split_list(&list)
                .iter()
                .map(|code| parse_value("TRANSIENT_STATUS_CODES", code))
                .collect::<Result<Vec<u16>>>()?;
        }

        if config.max_attempts == 0 {
            return Err(SummarizerError::Config("MAX_RETRIES must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Rejects a missing key or the placeholder shipped in `.env.example`.
    pub fn validate_api_key(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_key.starts_with(API_KEY_PLACEHOLDER_PREFIX) {
            return Err(SummarizerError::Config(
                "OPENROUTER_API_KEY is not set; get a key at https://openrouter.ai/keys".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub language: String,
    pub max_chars_per_artifact: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            language: "Russian".to_string(),
            max_chars_per_artifact: 12_000,
        }
    }
}

impl SummarizerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(language) = lookup("SUMMARY_LANGUAGE").filter(|v| !v.trim().is_empty()) {
            config.language = language.trim().to_string();
        }
        if let Some(value) = lookup("MAX_CHARS_PER_FILE").filter(|v| !v.trim().is_empty()) {
            config.max_chars_per_artifact = parse_value("MAX_CHARS_PER_FILE", value.trim())?;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub download_dir: PathBuf,
    pub program: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("./downloads"),
            program: "gdown".to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("DOWNLOAD_DIR") {
            if !dir.trim().is_empty() {
                config.download_dir = PathBuf::from(dir.trim());
            }
        }
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| SummarizerError::Config(format!("{} has an invalid value: {}", key, value)))
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    let seconds: f64 = parse_value(key, value)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SummarizerError::Config(format!("{} must be a non-negative number of seconds", key)));
    }
    Ok(Duration::from_secs_f64(seconds))
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Extraction failed for {identifier}: {reason}")]
    Extraction { identifier: String, reason: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No content could be extracted from any file")]
    NothingExtracted,

    #[error("Final summary failed ({kind}): {reason}")]
    Aggregation { kind: ErrorKind, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
