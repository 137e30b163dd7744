/*!
 * End-to-end tests of the batch pipeline against the mock provider
 */

use batchlingo::errors::{ProviderError, TranslationError};
use batchlingo::providers::mock::MockProvider;
use batchlingo::providers::openai::OpenAIRequest;
use batchlingo::translation::TranslationCache;

use crate::common::{self, texts};

/// Replies with a correctly sized map whose keys match none of the inputs
fn foreign_keys_reply(request: &OpenAIRequest) -> String {
    let map: serde_json::Map<String, serde_json::Value> = MockProvider::input_lines(request)
        .iter()
        .enumerate()
        .map(|(i, _)| (format!("unrelated {}", i), serde_json::Value::from("?")))
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// Translates the first input line and answers the rest under unrelated keys
fn partly_foreign_reply(request: &OpenAIRequest) -> String {
    let map: serde_json::Map<String, serde_json::Value> = MockProvider::input_lines(request)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                (line, serde_json::Value::from("T"))
            } else {
                (format!("zzz{}", i), serde_json::Value::from("?"))
            }
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// Replies with one shared key for every input, collapsing them on merge
fn colliding_keys_reply(request: &OpenAIRequest) -> String {
    let lines = MockProvider::input_lines(request);
    let map: serde_json::Map<String, serde_json::Value> = lines
        .iter()
        .map(|line| (line.clone(), serde_json::Value::from(format!("T({})", line))))
        .collect();
    let mut body = serde_json::Value::Object(map).to_string();
    // Every chunk answers "shared" for its first line
    if let Some(first) = lines.first() {
        body = body.replacen(&format!("\"{}\"", first), "\"shared\"", 1);
    }
    body
}

#[tokio::test]
async fn test_pipeline_zhToEn_shouldTranslateWithOneRequestAndCacheBoth() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);

    let result = pipeline
        .translator
        .translate_batch("ZH", "EN", &texts(&["你好", "世界", "你好"]))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result["你好"], "[TRANSLATED] 你好");
    assert_eq!(result["世界"], "[TRANSLATED] 世界");
    assert_eq!(provider.request_count(), 1);
    assert_eq!(pipeline.cache.len(), 2);
    assert!(pipeline.cache.get("ZH:EN:你好").is_some());
    assert!(pipeline.cache.get("ZH:EN:世界").is_some());
}

#[tokio::test]
async fn test_pipeline_repeatedRequest_shouldBeServedFromCache() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);
    let input = texts(&["你好", "世界"]);

    let first = pipeline.translator.translate_batch("ZH", "EN", &input).await.unwrap();
    let second = pipeline.translator.translate_batch("ZH", "EN", &input).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(pipeline.tracer.stats().total_calls, 1);
}

#[tokio::test]
async fn test_pipeline_partialCacheHit_shouldOnlySendMisses() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);
    pipeline.cache.put(TranslationCache::key_for("EN", "FR", "hello"), "bonjour");

    let result = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["hello", "world"]))
        .await
        .unwrap();

    assert_eq!(result["hello"], "bonjour");
    assert_eq!(result["world"], "[TRANSLATED] world");
    let request = provider.last_request().unwrap();
    assert_eq!(MockProvider::input_lines(&request), vec!["world".to_string()]);
}

#[tokio::test]
async fn test_pipeline_manyTexts_shouldSendCeilingOfChunkCountRequests() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 7, 3);
    let input: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();

    let result = pipeline.translator.translate_batch("EN", "DE", &input).await.unwrap();

    assert_eq!(result.len(), 50);
    assert_eq!(provider.request_count(), 8);
    assert!(input.iter().all(|text| result.contains_key(text)));
}

#[tokio::test]
async fn test_pipeline_concurrency_shouldNeverExceedLimit() {
    let provider = MockProvider::working().with_delay(common::overlap_delay());
    let pipeline = common::pipeline_sized(provider.clone(), 1, 3);
    let input: Vec<String> = (0..12).map(|i| format!("t{}", i)).collect();

    pipeline.translator.translate_batch("EN", "FR", &input).await.unwrap();

    assert_eq!(provider.request_count(), 12);
    assert!(provider.max_in_flight() <= 3);
    assert!(provider.max_in_flight() >= 2, "chunks should run concurrently");
}

#[tokio::test]
async fn test_pipeline_concurrencyOfOne_shouldRunSequentially() {
    let provider = MockProvider::working().with_delay(std::time::Duration::from_millis(5));
    let pipeline = common::pipeline_sized(provider.clone(), 1, 1);

    pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b", "c", "d"]))
        .await
        .unwrap();

    assert_eq!(provider.max_in_flight(), 1);
}

#[tokio::test]
async fn test_pipeline_transientFailures_shouldRetryAndSucceed() {
    let provider = MockProvider::fail_first(2);
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);

    let result = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b"]))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(provider.request_count(), 3);
    // The tracer sees the whole retried chunk as one successful call
    assert_eq!(pipeline.tracer.stats().success_calls, 1);
}

#[tokio::test]
async fn test_pipeline_persistentCountMismatch_shouldFailChunkAfterThreeAttempts() {
    let provider = MockProvider::count_mismatch();
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b", "c"]))
        .await
        .unwrap_err();

    assert_eq!(provider.request_count(), 3);
    match error {
        TranslationError::ChunkFailed { chunk_id, source } => {
            assert_eq!(chunk_id, 1);
            assert_eq!(source.attempts, 3);
        }
        other => panic!("expected ChunkFailed, got {:?}", other),
    }
    assert!(pipeline.cache.is_empty());
    assert_eq!(pipeline.tracer.stats().failed_calls, 1);
}

#[tokio::test]
async fn test_pipeline_failingChunks_shouldReportLowestChunkAndCacheNothing() {
    let provider = MockProvider::failing();
    let pipeline = common::pipeline_sized(provider.clone(), 2, 4);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b", "c", "d", "e", "f"]))
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::ChunkFailed { chunk_id: 1, .. }));
    // Every chunk still ran its full retry budget
    assert_eq!(provider.request_count(), 9);
    assert!(pipeline.cache.is_empty());
}

#[tokio::test]
async fn test_pipeline_unauthorized_shouldPropagateProviderErrorWithoutRetry() {
    let provider = MockProvider::unauthorized();
    let pipeline = common::pipeline_sized(provider.clone(), 20, 5);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a"]))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        TranslationError::Provider(ProviderError::AuthenticationError(_))
    ));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_pipeline_foreignKeys_shouldFailConsistencyCheckAndCacheNothing() {
    let provider = MockProvider::working().with_custom_response(foreign_keys_reply);
    let pipeline = common::pipeline_sized(provider, 20, 5);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b"]))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        TranslationError::InconsistentResult {
            expected: 2,
            actual: 0
        }
    ));
    assert!(pipeline.cache.is_empty());
}

#[tokio::test]
async fn test_pipeline_correctlySizedReplyMissingAnInput_shouldFailWithoutCachingMatches() {
    let provider = MockProvider::working().with_custom_response(partly_foreign_reply);
    let pipeline = common::pipeline_sized(provider, 20, 5);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b"]))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        TranslationError::InconsistentResult {
            expected: 2,
            actual: 1
        }
    ));
    // "a" was translated correctly but the batch failed, so nothing is cached
    assert!(pipeline.cache.get("EN:FR:a").is_none());
    assert!(pipeline.cache.is_empty());
}

#[tokio::test]
async fn test_pipeline_collidingKeysAcrossChunks_shouldFailConsistencyCheck() {
    let provider = MockProvider::working().with_custom_response(colliding_keys_reply);
    let pipeline = common::pipeline_sized(provider, 2, 2);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b", "c", "d"]))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        TranslationError::InconsistentResult {
            expected: 4,
            actual: 2
        }
    ));
}

#[tokio::test]
async fn test_pipeline_strictKeyValidation_shouldRejectForeignKeys() {
    let provider = MockProvider::working().with_custom_response(foreign_keys_reply);
    let mut config = common::test_config();
    config.llm.strict_key_validation = true;
    let pipeline = common::pipeline_with(provider.clone(), &config);

    let error = pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a"]))
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::ChunkFailed { .. }));
    assert_eq!(provider.request_count(), 3);
}
