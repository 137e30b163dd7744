/*!
 * Tests for deduplication, chunking and batch orchestration
 */

use batchlingo::errors::TranslationError;
use batchlingo::providers::mock::MockProvider;
use batchlingo::translation::item::{dedup_items, split_into_chunks};
use batchlingo::translation::{Chunk, TranslationCache, TranslationItem};

use crate::common::{self, texts};

#[test]
fn test_dedupItems_withRepeats_shouldKeepFirstOccurrences() {
    let items = dedup_items("EN", "FR", &texts(&["b", "a", "b", "c", "a"]));
    let contents: Vec<&str> = items.iter().map(|i| i.content.as_str()).collect();

    assert_eq!(contents, vec!["b", "a", "c"]);
    assert!(items.iter().all(|i| i.source_lang == "EN" && i.target_lang == "FR"));
}

#[test]
fn test_dedupItems_shouldTreatWhitespaceVariantsAsDistinct() {
    let items = dedup_items("EN", "FR", &texts(&["hello", "hello ", "Hello"]));
    assert_eq!(items.len(), 3);
}

#[test]
fn test_splitIntoChunks_shouldProduceCeilingChunkCountWithSequentialIds() {
    let items = dedup_items("EN", "FR", &(0..45).map(|i| i.to_string()).collect::<Vec<_>>());
    let chunks = split_into_chunks(&items, 20).unwrap();

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks.iter().map(Chunk::id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(chunks.iter().map(Chunk::len).collect::<Vec<_>>(), vec![20, 20, 5]);
    assert_eq!(chunks[2].items()[0].content, "40");
}

#[test]
fn test_splitIntoChunks_withExactMultiple_shouldNotAddEmptyChunk() {
    let items = dedup_items("EN", "FR", &texts(&["a", "b", "c", "d"]));
    let chunks = split_into_chunks(&items, 2).unwrap();

    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| !c.is_empty()));
}

#[test]
fn test_splitIntoChunks_withZeroSize_shouldFail() {
    let items = dedup_items("EN", "FR", &texts(&["a"]));
    assert!(matches!(
        split_into_chunks(&items, 0),
        Err(TranslationError::InvalidChunk(_))
    ));
}

#[test]
fn test_translationItem_cacheKey_shouldMatchCacheKeyFor() {
    let item = TranslationItem::new("ZH", "EN", "你好: 世界");
    assert_eq!(
        item.cache_key(),
        TranslationCache::key_for("ZH", "EN", "你好: 世界")
    );
}

#[test]
fn test_chunk_new_withMixedPairs_shouldFail() {
    let items = vec![
        TranslationItem::new("EN", "FR", "a"),
        TranslationItem::new("EN", "DE", "b"),
    ];
    assert!(Chunk::new(1, items).is_err());
    assert!(Chunk::new(1, Vec::new()).is_err());
}

#[tokio::test]
async fn test_translateBatch_withEmptyInput_shouldReturnEmptyMapWithoutCalls() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 10, 2);

    let result = pipeline.translator.translate_batch("ZH", "EN", &[]).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(provider.request_count(), 0);
    assert!(pipeline.tracer.is_empty());
}

#[tokio::test]
async fn test_translateBatch_shouldCacheUnderLanguagePairKey() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider, 10, 2);

    pipeline
        .translator
        .translate_batch("ZH", "EN", &texts(&["你好"]))
        .await
        .unwrap();

    assert_eq!(
        pipeline.cache.get(&TranslationCache::key_for("ZH", "EN", "你好")),
        Some("[TRANSLATED] 你好".to_string())
    );
    assert!(pipeline.cache.get("ZH:FR:你好").is_none());
}

#[tokio::test]
async fn test_translateBatch_withOtherTargetLanguage_shouldNotReuseCache() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider.clone(), 10, 2);
    let input = texts(&["你好"]);

    pipeline.translator.translate_batch("ZH", "EN", &input).await.unwrap();
    pipeline.translator.translate_batch("ZH", "FR", &input).await.unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(pipeline.cache.len(), 2);
}

#[tokio::test]
async fn test_translateBatch_shouldRecordOneTracePerChunk() {
    let provider = MockProvider::working();
    let pipeline = common::pipeline_sized(provider, 2, 2);

    pipeline
        .translator
        .translate_batch("EN", "FR", &texts(&["a", "b", "c", "d", "e"]))
        .await
        .unwrap();

    let stats = pipeline.tracer.stats();
    assert_eq!(stats.total_calls, 3);
    assert_eq!(stats.success_calls, 3);
    assert!((stats.success_rate - 100.0).abs() < 1e-9);
}
