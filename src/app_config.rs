use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration module
/// This module handles the pipeline configuration including loading
/// and validating configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chunking and fan-out settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Translation cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Call tracing settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Completion endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    // @field: Chat completion URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    // @field: Bearer token
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Attempts per chunk
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // @field: Delay between attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Require the returned keys to match the chunk's texts exactly, not just
    /// their count
    #[serde(default)]
    pub strict_key_validation: bool,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            strict_key_validation: false,
        }
    }
}

/// Chunking and concurrency configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum number of texts sent in one completion request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of completion requests in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached translations
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Lifetime of a cached translation in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Call tracing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Number of most recent calls kept for the status report
    #[serde(default = "default_trace_capacity")]
    pub trace_capacity: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            trace_capacity: default_trace_capacity(),
        }
    }
}

/// Prompt templates.
///
/// Both templates may use `{source_lang}` and `{target_lang}`; the user
/// prompt must also contain `{input_text}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_chunk_size() -> usize {
    20
}

fn default_max_concurrency() -> usize {
    5
}

fn default_cache_capacity() -> usize {
    5000
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_trace_capacity() -> usize {
    100
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate every line the user sends from {source_lang} to {target_lang}. Reply with a single JSON object whose keys are the original lines, verbatim and without the leading dash, and whose values are their translations. Return exactly one entry per line and nothing else.".to_string()
}

fn default_user_prompt() -> String {
    "Translate the following {source_lang} lines into {target_lang}:\n{input_text}".to_string()
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load a configuration file if it exists, otherwise use the defaults
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_url.trim().is_empty() {
            return Err(anyhow!("LLM API URL is required"));
        }
        url::Url::parse(&self.llm.api_url)
            .map_err(|e| anyhow!("Invalid LLM API URL '{}': {}", self.llm.api_url, e))?;

        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("LLM model name is required"));
        }
        if self.llm.max_retries == 0 {
            return Err(anyhow!("max_retries must be at least 1"));
        }
        if self.batch.chunk_size == 0 {
            return Err(anyhow!("chunk_size must be at least 1"));
        }
        if self.batch.max_concurrency == 0 {
            return Err(anyhow!("max_concurrency must be at least 1"));
        }
        if self.cache.capacity == 0 {
            return Err(anyhow!("cache capacity must be at least 1"));
        }
        if self.monitoring.trace_capacity == 0 {
            return Err(anyhow!("trace_capacity must be at least 1"));
        }
        if !self.prompts.user_prompt.contains("{input_text}") {
            return Err(anyhow!("User prompt template must contain {{input_text}}"));
        }

        Ok(())
    }
}
