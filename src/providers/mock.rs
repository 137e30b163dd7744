/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always answers with one translation per input line
 * - `MockProvider::fail_first(n)` - Fails with a connection error n times, then works
 * - `MockProvider::count_mismatch()` - Always drops one entry from the reply
 * - `MockProvider::failing()` - Always fails with a connection error
 * - `MockProvider::unauthorized()` - Always fails with an authentication error
 * - `MockProvider::no_json()` - Answers in prose without any JSON object
 *
 * Every request is counted, and the number of requests in flight at the
 * same time is tracked so tests can assert concurrency limits.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::providers::openai::{
    OpenAIChoice, OpenAIRequest, OpenAIResponse, OpenAIResponseMessage,
};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation map
    Working,
    /// Fails with a connection error for the first `failures` requests
    FailFirst { failures: usize },
    /// Returns a map with one entry fewer than requested
    CountMismatch,
    /// Always fails with a connection error
    Failing,
    /// Always fails with an authentication error
    Unauthorized,
    /// Returns prose that contains no JSON object
    NoJson,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Simulated network latency
    delay: Option<Duration>,
    /// Total number of requests received
    request_count: Arc<AtomicUsize>,
    /// Requests currently being served
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` has reached
    max_in_flight: Arc<AtomicUsize>,
    /// Last request received
    last_request: Arc<Mutex<Option<OpenAIRequest>>>,
    /// Custom reply generator (optional)
    custom_response: Option<fn(&OpenAIRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that fails `failures` times before succeeding
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a mock whose replies always miss one entry
    pub fn count_mismatch() -> Self {
        Self::new(MockBehavior::CountMismatch)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rejects the API key
    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Create a mock that never returns JSON
    pub fn no_json() -> Self {
        Self::new(MockBehavior::NoJson)
    }

    /// Delay every reply by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set a custom reply generator used in place of the default translation map
    pub fn with_custom_response(mut self, generator: fn(&OpenAIRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests that were served concurrently
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<OpenAIRequest> {
        self.last_request.lock().clone()
    }

    /// The bulleted input lines of a request's user prompt
    pub fn input_lines(request: &OpenAIRequest) -> Vec<String> {
        request
            .user_content()
            .unwrap_or_default()
            .lines()
            .filter_map(|line| line.strip_prefix("- "))
            .map(str::to_string)
            .collect()
    }

    /// Build a reply mapping every input line to `"[TRANSLATED] <line>"`
    pub fn generate_translation_map(lines: &[String]) -> String {
        let map: serde_json::Map<String, serde_json::Value> = lines
            .iter()
            .map(|line| {
                (
                    line.clone(),
                    serde_json::Value::String(format!("[TRANSLATED] {}", line)),
                )
            })
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    /// Wrap reply text in a chat completion response
    pub fn response_with_content(content: impl Into<String>) -> OpenAIResponse {
        OpenAIResponse {
            choices: vec![OpenAIChoice {
                message: OpenAIResponseMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    fn reply(&self, request: &OpenAIRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => Self::generate_translation_map(&Self::input_lines(request)),
        }
    }

    fn respond(&self, count: usize, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        match self.behavior {
            MockBehavior::Working => Ok(Self::response_with_content(self.reply(request))),

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    Err(ProviderError::ConnectionError(format!(
                        "Simulated connection failure {} of {}",
                        count + 1,
                        failures
                    )))
                } else {
                    Ok(Self::response_with_content(self.reply(request)))
                }
            }

            MockBehavior::CountMismatch => {
                let mut lines = Self::input_lines(request);
                lines.pop();
                Ok(Self::response_with_content(Self::generate_translation_map(&lines)))
            }

            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection refused".to_string(),
            )),

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError(
                "Simulated invalid API key".to_string(),
            )),

            MockBehavior::NoJson => Ok(Self::response_with_content(
                "Sorry, I can only answer in plain sentences today.",
            )),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            delay: self.delay,
            request_count: Arc::clone(&self.request_count),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
            last_request: Arc::clone(&self.last_request),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.respond(count, &request);
        *self.last_request.lock() = Some(request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn extract_text(response: &OpenAIResponse) -> Option<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
    }
}
