/*!
 * Provider implementations for chat completion services.
 *
 * This module contains client implementations the LLM client can send
 * translation requests through:
 * - OpenAI: any OpenAI-compatible chat completion endpoint
 * - Mock: scripted in-process provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the LLM client.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract the model's reply text from the provider response
    ///
    /// Returns `None` when the response carries no message content.
    fn extract_text(response: &Self::Response) -> Option<String>;
}

pub mod mock;
pub mod openai;
