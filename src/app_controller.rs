use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::AppError;
use crate::providers::Provider;
use crate::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};
use crate::translation::{
    BatchTranslator, CallTracer, LlmClient, LlmStats, TranslationCache, TranslationResult,
};

// @module: Application controller wiring configuration, cache, tracer and translator

/// Translation request as supplied by callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationRequest {
    /// Source language code
    #[serde(rename = "from")]
    pub source_lang: String,

    /// Target language code
    #[serde(rename = "to")]
    pub target_lang: String,

    /// Texts to translate; duplicates allowed
    pub items: Vec<String>,
}

/// Translation response returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationResponse {
    pub translated_map: TranslationResult,
}

/// Service status: call statistics plus cache occupancy
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServiceStatus {
    #[serde(flatten)]
    pub stats: LlmStats,
    pub cache_size: usize,
}

/// Main application controller
///
/// Owns the process-wide cache and tracer and hands them to the translator.
pub struct Controller<P = OpenAI> {
    // @field: App configuration
    config: Config,
    cache: TranslationCache,
    tracer: Arc<CallTracer>,
    translator: BatchTranslator<P>,
}

impl Controller<OpenAI> {
    // @method: Create a controller talking to the configured endpoint
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let provider = OpenAI::new(
            config.llm.api_key.clone(),
            config.llm.api_url.clone(),
            config.llm.timeout(),
        );
        Self::with_provider(config, provider)
    }
}

impl<P> Controller<P>
where
    P: Provider<Request = OpenAIRequest, Response = OpenAIResponse> + 'static,
{
    // @method: Create a controller using an explicit provider
    pub fn with_provider(config: Config, provider: P) -> Result<Self, AppError> {
        config
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let cache = TranslationCache::new(config.cache.capacity, config.cache.ttl());
        let tracer = Arc::new(CallTracer::new(config.monitoring.trace_capacity));
        let client = LlmClient::from_config(provider, &config);
        let translator =
            BatchTranslator::new(client, cache.clone(), Arc::clone(&tracer), &config.batch);

        info!(
            "Controller ready: model {}, chunk size {}, max concurrency {}",
            config.llm.model, config.batch.chunk_size, config.batch.max_concurrency
        );

        Ok(Self {
            config,
            cache,
            tracer,
            translator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn translator(&self) -> &BatchTranslator<P> {
        &self.translator
    }

    /// Translate a list of texts into an original-to-translation map.
    ///
    /// An empty list or a blank language code is rejected as invalid input.
    /// Pipeline failures are logged in full and returned as translation errors.
    pub async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        items: &[String],
    ) -> Result<TranslationResult, AppError> {
        if items.is_empty() {
            return Err(AppError::InvalidInput("the item list must not be empty".to_string()));
        }
        if source_lang.trim().is_empty() || target_lang.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "source and target languages are required".to_string(),
            ));
        }

        self.translator
            .translate_batch(source_lang, target_lang, items)
            .await
            .map_err(|e| {
                error!("Batch translation {} -> {} failed: {}", source_lang, target_lang, e);
                AppError::Translation(e)
            })
    }

    /// Handle a complete request
    pub async fn handle(&self, request: &TranslationRequest) -> Result<TranslationResponse, AppError> {
        let translated_map = self
            .translate(&request.source_lang, &request.target_lang, &request.items)
            .await?;
        Ok(TranslationResponse { translated_map })
    }

    /// Current call statistics and cache size
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            stats: self.tracer.stats(),
            cache_size: self.cache.len(),
        }
    }
}
