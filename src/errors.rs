/*!
 * Error types for the batchlingo library.
 *
 * This module contains custom error types for the different layers of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a completion provider
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether another attempt at the same request may succeed.
    ///
    /// Connection problems, timeouts, rate limiting and server-side (5xx)
    /// failures are transient. Authentication failures and other client-side
    /// (4xx) rejections will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::ConnectionError(_)
            | Self::Timeout(_)
            | Self::RateLimitExceeded(_)
            | Self::ParseError(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationError(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// A chunk could not be translated within the retry budget
#[derive(Error, Debug)]
#[error("chunk {chunk_id}: no valid response after {attempts} attempt(s): {message}")]
pub struct LlmApiError {
    /// 1-based id of the chunk within its batch
    pub chunk_id: usize,
    /// Number of attempts made before giving up
    pub attempts: u32,
    /// Description of the last failure
    pub message: String,
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// A single chunk exhausted its retry budget
    #[error("LLM API error: {0}")]
    LlmApi(#[from] LlmApiError),

    /// A chunk of a batch failed, failing the whole batch
    #[error("Chunk {chunk_id} translation failed: {source}")]
    ChunkFailed {
        /// 1-based id of the failing chunk
        chunk_id: usize,
        /// The exhausted chunk error
        #[source]
        source: LlmApiError,
    },

    /// Every chunk succeeded but the merged result does not cover the input
    #[error("Inconsistent translation result: expected {expected} translated texts, got {actual}")]
    InconsistentResult {
        /// Number of unique input strings
        expected: usize,
        /// Number of unique input strings with a translation in the merged result
        actual: usize,
    },

    /// A non-retryable error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A chunk was built from an empty or mixed-language item list
    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    /// A chunk task ended without producing a result (panic or abort)
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied an unusable request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Whether the error was caused by the caller's request rather than the pipeline
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
