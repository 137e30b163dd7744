/*!
 * Batch translation pipeline.
 *
 * This module contains the functionality for translating lists of texts
 * through a chat completion model. It is split into several submodules:
 *
 * - `item`: Translation items, chunks and the deduplication/chunking helpers
 * - `cache`: TTL-bounded LRU cache of finished translations
 * - `prompts`: Prompt templates
 * - `client`: Per-chunk LLM client with retry and reply validation
 * - `monitoring`: Call tracing and statistics
 * - `batch`: Batch orchestration (cache probe, fan-out, merge, consistency)
 */

// Re-export main types for easier usage
pub use self::batch::BatchTranslator;
pub use self::cache::TranslationCache;
pub use self::client::{ClientOptions, LlmClient};
pub use self::item::{Chunk, TranslationItem, TranslationResult};
pub use self::monitoring::{CallTrace, CallTracer, LlmStats, TraceRecord};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod cache;
pub mod client;
pub mod item;
pub mod monitoring;
pub mod prompts;
