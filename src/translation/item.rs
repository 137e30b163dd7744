/*!
 * Translation items, chunks and results.
 *
 * Items are deduplicated by content and grouped into size-bounded chunks
 * before being sent to the model. Every chunk holds a single language pair.
 */

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::errors::TranslationError;
use crate::translation::cache::TranslationCache;

/// Mapping from original text to translated text
pub type TranslationResult = HashMap<String, String>;

/// A single text to translate together with its language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationItem {
    /// Source language code (e.g. "ZH")
    #[serde(rename = "from")]
    pub source_lang: String,

    /// Target language code (e.g. "EN")
    #[serde(rename = "to")]
    pub target_lang: String,

    /// Text to translate
    pub content: String,
}

impl TranslationItem {
    pub fn new(
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            content: content.into(),
        }
    }

    /// Cache key in the form `"{source_lang}:{target_lang}:{content}"`
    pub fn cache_key(&self) -> String {
        TranslationCache::key_for(&self.source_lang, &self.target_lang, &self.content)
    }

    fn same_pair(&self, other: &TranslationItem) -> bool {
        self.source_lang == other.source_lang && self.target_lang == other.target_lang
    }
}

/// A non-empty group of items sharing one language pair, sent in one request
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based position within the batch
    id: usize,
    items: Vec<TranslationItem>,
}

impl Chunk {
    /// Create a chunk, rejecting empty and mixed-language item lists
    pub fn new(id: usize, items: Vec<TranslationItem>) -> Result<Self, TranslationError> {
        let Some(first) = items.first() else {
            return Err(TranslationError::InvalidChunk(format!("chunk {} is empty", id)));
        };

        if let Some(other) = items.iter().find(|item| !item.same_pair(first)) {
            return Err(TranslationError::InvalidChunk(format!(
                "chunk {} mixes {}->{} with {}->{}",
                id, first.source_lang, first.target_lang, other.source_lang, other.target_lang
            )));
        }

        Ok(Self { id, items })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn items(&self) -> &[TranslationItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; an empty chunk cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn source_lang(&self) -> &str {
        &self.items[0].source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.items[0].target_lang
    }

    /// Original texts in chunk order
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.content.as_str())
    }
}

/// Turn raw texts into unique items, keeping the first occurrence of each text
pub fn dedup_items(source_lang: &str, target_lang: &str, texts: &[String]) -> Vec<TranslationItem> {
    let mut seen = HashSet::with_capacity(texts.len());
    texts
        .iter()
        .filter(|text| seen.insert(text.as_str()))
        .map(|text| TranslationItem::new(source_lang, target_lang, text.as_str()))
        .collect()
}

/// Split items into consecutive chunks of at most `chunk_size` items
///
/// Produces `ceil(items.len() / chunk_size)` chunks with ids starting at 1.
pub fn split_into_chunks(
    items: &[TranslationItem],
    chunk_size: usize,
) -> Result<Vec<Chunk>, TranslationError> {
    if chunk_size == 0 {
        return Err(TranslationError::InvalidChunk(
            "chunk size must be at least 1".to_string(),
        ));
    }

    items
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, group)| Chunk::new(index + 1, group.to_vec()))
        .collect()
}
