/*!
 * Common test utilities for the batchlingo test suite
 */

use std::sync::Arc;
use std::time::Duration;

use batchlingo::app_config::Config;
use batchlingo::providers::mock::MockProvider;
use batchlingo::translation::{BatchTranslator, CallTracer, LlmClient, TranslationCache};


/// Install a test logger once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration with no retry backoff so failing paths finish quickly
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.llm.api_url = "http://127.0.0.1:9/v1/chat/completions".to_string();
    config.llm.api_key = "test-api-key".to_string();
    config.llm.retry_backoff_ms = 0;
    config.batch.chunk_size = 10;
    config.batch.max_concurrency = 4;
    config
}

/// Owned strings from string slices
pub fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A translator wired to `provider` plus handles to its cache and tracer
pub struct TestPipeline {
    pub translator: BatchTranslator<MockProvider>,
    pub cache: TranslationCache,
    pub tracer: Arc<CallTracer>,
}

/// Build a translator around `provider` using `config`
pub fn pipeline_with(provider: MockProvider, config: &Config) -> TestPipeline {
    init_logging();
    let cache = TranslationCache::new(config.cache.capacity, config.cache.ttl());
    let tracer = Arc::new(CallTracer::new(config.monitoring.trace_capacity));
    let client = LlmClient::from_config(provider, config);
    let translator = BatchTranslator::new(client, cache.clone(), Arc::clone(&tracer), &config.batch);
    TestPipeline {
        translator,
        cache,
        tracer,
    }
}

/// Build a translator with the given chunk size and concurrency limit
pub fn pipeline_sized(provider: MockProvider, chunk_size: usize, max_concurrency: usize) -> TestPipeline {
    let mut config = test_config();
    config.batch.chunk_size = chunk_size;
    config.batch.max_concurrency = max_concurrency;
    pipeline_with(provider, &config)
}

/// A short delay that keeps mock requests overlapping
pub fn overlap_delay() -> Duration {
    Duration::from_millis(40)
}
