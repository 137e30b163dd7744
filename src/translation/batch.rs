/*!
 * Batch translation processing.
 *
 * This module turns a list of texts into a complete original-to-translation
 * map: duplicates are collapsed, cached translations are reused, the rest is
 * split into chunks that are translated concurrently under a concurrency
 * limit, and the merged result is checked for completeness before it is
 * returned. Any chunk failure fails the whole batch.
 */

use futures::future::join_all;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::app_config::BatchConfig;
use crate::errors::TranslationError;
use crate::providers::Provider;
use crate::providers::openai::{OpenAIRequest, OpenAIResponse};

use super::cache::TranslationCache;
use super::client::LlmClient;
use super::item::{Chunk, TranslationItem, TranslationResult, dedup_items, split_into_chunks};
use super::monitoring::CallTracer;

/// Batch translator for turning text lists into translation maps
pub struct BatchTranslator<P> {
    /// Client used for every chunk
    client: Arc<LlmClient<P>>,

    /// Shared translation cache
    cache: TranslationCache,

    /// Shared call tracer
    tracer: Arc<CallTracer>,

    /// Maximum number of texts per request
    chunk_size: usize,

    /// Maximum number of concurrent requests
    max_concurrency: usize,
}

impl<P> BatchTranslator<P>
where
    P: Provider<Request = OpenAIRequest, Response = OpenAIResponse> + 'static,
{
    /// Create a new batch translator
    pub fn new(
        client: LlmClient<P>,
        cache: TranslationCache,
        tracer: Arc<CallTracer>,
        options: &BatchConfig,
    ) -> Self {
        Self {
            client: Arc::new(client),
            cache,
            tracer,
            chunk_size: options.chunk_size.max(1),
            max_concurrency: options.max_concurrency.max(1),
        }
    }

    pub fn client(&self) -> &LlmClient<P> {
        &self.client
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn tracer(&self) -> &Arc<CallTracer> {
        &self.tracer
    }

    /// Translate `texts` from `source_language` to `target_language`
    ///
    /// The returned map has exactly one entry per distinct input text. Callers
    /// needing a positional list look each original text up in the map.
    pub async fn translate_batch(
        &self,
        source_language: &str,
        target_language: &str,
        texts: &[String],
    ) -> Result<TranslationResult, TranslationError> {
        if texts.is_empty() {
            return Ok(HashMap::new());
        }

        let unique_items = dedup_items(source_language, target_language, texts);
        info!(
            "Received {} texts to translate, {} of them unique",
            texts.len(),
            unique_items.len()
        );

        let mut result = HashMap::with_capacity(unique_items.len());
        let mut misses = Vec::new();
        for item in &unique_items {
            match self.cache.get(&item.cache_key()) {
                Some(cached) => {
                    result.insert(item.content.clone(), cached);
                }
                None => misses.push(item.clone()),
            }
        }

        if !result.is_empty() {
            info!("Cache hits: {} / {}", result.len(), unique_items.len());
        }
        if misses.is_empty() {
            info!("All translations served from cache");
            return Ok(result);
        }

        let chunks = split_into_chunks(&misses, self.chunk_size)?;
        info!(
            "Translating {} texts through the API in {} chunks",
            misses.len(),
            chunks.len()
        );

        let start_time = Instant::now();
        let translated = self.translate_chunks(chunks).await?;
        let chunk_count = translated.len();

        let mut fresh = Vec::new();
        for (chunk, translations) in translated {
            fresh.extend(Self::merge_chunk(&chunk, translations, &mut result));
        }

        info!(
            "All {} chunks translated in {:.2}s",
            chunk_count,
            start_time.elapsed().as_secs_f64()
        );

        let covered = unique_items
            .iter()
            .filter(|item| result.contains_key(&item.content))
            .count();
        if covered != unique_items.len() || result.len() != unique_items.len() {
            error!(
                "Translated {} of {} unique texts ({} entries returned); translations were lost",
                covered,
                unique_items.len(),
                result.len()
            );
            return Err(TranslationError::InconsistentResult {
                expected: unique_items.len(),
                actual: covered,
            });
        }

        for (key, translation) in fresh {
            self.cache.put(key, translation);
        }

        Ok(result)
    }

    /// Translate every chunk concurrently and wait for all of them.
    ///
    /// Returns the chunks with their translations in chunk order, or the
    /// error of the lowest-numbered failing chunk.
    async fn translate_chunks(
        &self,
        chunks: Vec<Chunk>,
    ) -> Result<Vec<(Chunk, TranslationResult)>, TranslationError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let client = Arc::clone(&self.client);
                let tracer = Arc::clone(&self.tracer);
                let semaphore = Arc::clone(&semaphore);
                let chunk_id = chunk.id();

                let handle = tokio::spawn(async move {
                    info!("Chunk {}: queued ({} texts)", chunk.id(), chunk.len());
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| TranslationError::Unexpected(e.to_string()))?;

                    let translations = tracer.record(client.translate(&chunk)).await?;
                    Ok::<_, TranslationError>((chunk, translations))
                });
                (chunk_id, handle)
            })
            .collect();

        let (ids, handles): (Vec<usize>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = join_all(handles).await;

        let mut translated = Vec::with_capacity(outcomes.len());
        for (chunk_id, outcome) in ids.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(pair)) => translated.push(pair),
                Ok(Err(TranslationError::LlmApi(source))) => {
                    error!("Fatal error while translating chunk {}: {}", chunk_id, source);
                    return Err(TranslationError::ChunkFailed { chunk_id, source });
                }
                Ok(Err(other)) => {
                    error!("Fatal error while translating chunk {}: {}", chunk_id, other);
                    return Err(other);
                }
                Err(join_error) => {
                    error!("Chunk {} task did not complete: {}", chunk_id, join_error);
                    return Err(TranslationError::Unexpected(format!(
                        "chunk {} task did not complete: {}",
                        chunk_id, join_error
                    )));
                }
            }
        }

        Ok(translated)
    }

    /// Add a chunk's translations to `result`.
    ///
    /// Returns the cache entries for the translations that match an input text.
    fn merge_chunk(
        chunk: &Chunk,
        translations: TranslationResult,
        result: &mut TranslationResult,
    ) -> Vec<(String, String)> {
        let by_content: HashMap<&str, &TranslationItem> = chunk
            .items()
            .iter()
            .map(|item| (item.content.as_str(), item))
            .collect();

        let mut entries = Vec::with_capacity(translations.len());
        for (original, translation) in translations {
            match by_content.get(original.as_str()) {
                Some(item) => entries.push((item.cache_key(), translation.clone())),
                None => warn!(
                    "Chunk {}: translated text '{}' matches no input text",
                    chunk.id(),
                    original
                ),
            }
            result.insert(original, translation);
        }
        entries
    }
}
