/*!
 * LLM client for translating a single chunk.
 *
 * One request is sent per attempt. A reply is accepted only when it contains
 * a JSON object with exactly one string value per input text. Transient
 * transport failures and malformed replies are retried up to the configured
 * budget; anything else is returned immediately.
 */

use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::app_config::{Config, LlmConfig};
use crate::errors::{LlmApiError, TranslationError};
use crate::providers::Provider;
use crate::providers::openai::{OpenAIRequest, OpenAIResponse};
use crate::translation::item::{Chunk, TranslationResult};
use crate::translation::prompts::TranslationPromptBuilder;

/// First `{` through last `}`, across lines
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON object pattern is valid"));

/// Why a model reply was rejected
#[derive(Error, Debug)]
pub enum ReplyDefect {
    #[error("response contained no message content")]
    MissingContent,

    #[error("no JSON object found in model reply")]
    NoJsonObject,

    #[error("invalid JSON in model reply: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model reply is not a JSON object")]
    NotAnObject,

    #[error("translation for '{0}' is not a string")]
    NonStringValue(String),

    #[error("expected {expected} translations, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("reply keys do not match the input texts: {0:?}")]
    UnexpectedKeys(Vec<String>),
}

/// Settings that control one chunk translation
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Model name sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Total attempts per chunk
    pub max_retries: u32,
    /// Sleep between failed attempts
    pub retry_backoff: Duration,
    /// Also require the reply keys to equal the input texts
    pub strict_key_validation: bool,
}

impl ClientOptions {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
            strict_key_validation: config.strict_key_validation,
        }
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Translates chunks through a completion provider
#[derive(Debug)]
pub struct LlmClient<P> {
    provider: P,
    prompts: TranslationPromptBuilder,
    options: ClientOptions,
}

impl<P> LlmClient<P>
where
    P: Provider<Request = OpenAIRequest, Response = OpenAIResponse>,
{
    pub fn new(provider: P, prompts: TranslationPromptBuilder, options: ClientOptions) -> Self {
        Self {
            provider,
            prompts,
            options,
        }
    }

    /// Create a client using the prompt and endpoint settings of `config`
    pub fn from_config(provider: P, config: &Config) -> Self {
        Self::new(
            provider,
            TranslationPromptBuilder::from_config(&config.prompts),
            ClientOptions::from_config(&config.llm),
        )
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn build_request(&self, chunk: &Chunk) -> OpenAIRequest {
        let (system_prompt, user_prompt) = self.prompts.build(chunk);
        OpenAIRequest::new(&self.options.model)
            .add_message("system", system_prompt)
            .add_message("user", user_prompt)
            .json_object()
            .temperature(self.options.temperature)
    }

    /// Translate one chunk, retrying transient failures and malformed replies
    ///
    /// # Returns
    /// * `Ok(map)` - one translation per chunk item
    /// * `Err(TranslationError::LlmApi)` - the retry budget ran out
    /// * `Err(TranslationError::Provider)` - a non-transient provider failure
    pub async fn translate(&self, chunk: &Chunk) -> Result<TranslationResult, TranslationError> {
        let chunk_id = chunk.id();
        let max_retries = self.options.max_retries.max(1);
        let request = self.build_request(chunk);

        let mut last_failure = String::new();

        for attempt in 1..=max_retries {
            debug!(
                "Chunk {}: sending {} texts (attempt {}/{})",
                chunk_id,
                chunk.len(),
                attempt,
                max_retries
            );

            let started = Instant::now();
            let outcome = self.provider.complete(request.clone()).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(response) => {
                    info!("Chunk {}: model request took {:.2}s", chunk_id, elapsed.as_secs_f64());

                    let parsed = P::extract_text(&response)
                        .ok_or(ReplyDefect::MissingContent)
                        .and_then(|content| {
                            parse_reply(&content, chunk, self.options.strict_key_validation)
                        });

                    match parsed {
                        Ok(translations) => return Ok(translations),
                        Err(defect) => {
                            warn!(
                                "Chunk {}: attempt {}/{} returned an unusable reply: {}",
                                chunk_id, attempt, max_retries, defect
                            );
                            last_failure = defect.to_string();
                        }
                    }
                }
                Err(e) if e.is_transient() => {
                    error!(
                        "Chunk {}: request failed on attempt {}/{}: {}",
                        chunk_id, attempt, max_retries, e
                    );
                    last_failure = e.to_string();
                }
                Err(e) => {
                    error!("Chunk {}: request rejected, not retrying: {}", chunk_id, e);
                    return Err(TranslationError::Provider(e));
                }
            }

            if attempt < max_retries && !self.options.retry_backoff.is_zero() {
                tokio::time::sleep(self.options.retry_backoff).await;
            }
        }

        Err(LlmApiError {
            chunk_id,
            attempts: max_retries,
            message: last_failure,
        }
        .into())
    }
}

/// Extract the first JSON object from a model reply.
///
/// Models sometimes wrap the object in prose or code fences.
pub fn extract_json_object(content: &str) -> Option<&str> {
    JSON_OBJECT.find(content).map(|m| m.as_str())
}

/// Parse and validate a model reply for `chunk`
pub fn parse_reply(
    content: &str,
    chunk: &Chunk,
    strict_keys: bool,
) -> Result<TranslationResult, ReplyDefect> {
    let json = extract_json_object(content).ok_or(ReplyDefect::NoJsonObject)?;
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Object(object) = value else {
        return Err(ReplyDefect::NotAnObject);
    };

    if object.len() != chunk.len() {
        return Err(ReplyDefect::CountMismatch {
            expected: chunk.len(),
            actual: object.len(),
        });
    }

    if strict_keys {
        let expected: HashSet<&str> = chunk.contents().collect();
        let unexpected: Vec<String> = object
            .keys()
            .filter(|key| !expected.contains(key.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(ReplyDefect::UnexpectedKeys(unexpected));
        }
    }

    object
        .into_iter()
        .map(|(original, translated)| match translated {
            serde_json::Value::String(text) => Ok((original, text)),
            _ => Err(ReplyDefect::NonStringValue(original)),
        })
        .collect()
}
