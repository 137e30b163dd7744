/*!
 * # batchlingo - Batch translation through chat completion models
 *
 * A Rust library that turns a list of texts into a complete
 * original-to-translation map with as few model calls as possible.
 *
 * ## Features
 *
 * - Deduplication of repeated input texts
 * - Cache-first lookup with a TTL-bounded LRU cache
 * - Size-bounded chunking of cache misses
 * - Concurrent chunk translation under a concurrency limit
 * - Per-chunk retry with structural validation of the model's JSON reply
 * - Global completeness check before a result is returned
 * - Call tracing with success rate and latency statistics
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Wiring of cache, tracer and translator; request validation
 * - `translation`: The batch translation pipeline:
 *   - `translation::batch`: Batch orchestration
 *   - `translation::client`: Per-chunk LLM client
 *   - `translation::cache`: Translation cache
 *   - `translation::monitoring`: Call tracing
 * - `providers`: Client implementations for completion endpoints:
 *   - `providers::openai`: OpenAI-compatible chat completion client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, ServiceStatus, TranslationRequest, TranslationResponse};
pub use errors::{AppError, LlmApiError, ProviderError, TranslationError};
pub use translation::{BatchTranslator, CallTracer, LlmClient, LlmStats, TranslationCache};
