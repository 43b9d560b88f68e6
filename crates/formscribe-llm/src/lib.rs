//! Formscribe LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `formscribe-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing, records every request
//! - `OpenAiProvider`: OpenAI-compatible chat completions with JSON output mode
//!
//! # Examples
//!
//! ```
//! use formscribe_llm::MockProvider;
//! use formscribe_domain::traits::{LlmProvider, ModelRequest};
//!
//! let provider = MockProvider::new(r#"{"fields": {}}"#);
//! let request = ModelRequest {
//!     system: "system".to_string(),
//!     user: "user".to_string(),
//!     json_output: true,
//! };
//! assert_eq!(provider.complete(&request).unwrap(), r#"{"fields": {}}"#);
//! ```

#![warn(missing_docs)]

pub mod openai;

use formscribe_domain::traits::{LlmProvider, ModelRequest};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// API key rejected or missing
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    replies: Vec<(String, MockReply)>,
    requests: Vec<ModelRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured replies without making any network calls. A reply
/// registered with [`MockProvider::add_response`] is used when its needle
/// occurs in the user instruction; otherwise the default reply is returned.
///
/// # Examples
///
/// ```
/// use formscribe_llm::MockProvider;
/// use formscribe_domain::traits::{LlmProvider, ModelRequest};
///
/// let mut provider = MockProvider::default();
/// provider.add_response("weight", r#"{"fields": {"vitals.weight": {}}}"#);
///
/// let request = ModelRequest {
///     system: String::new(),
///     user: "Weight (ID: vitals.weight, Type: number)".to_string(),
///     json_output: true,
/// };
/// assert!(provider.complete(&request).unwrap().contains("vitals.weight"));
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed reply for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Reply with `response` whenever the user instruction contains `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.state()
            .replies
            .push((needle.into(), MockReply::Text(response.into())));
    }

    /// Fail whenever the user instruction contains `needle`
    pub fn add_error(&mut self, needle: impl Into<String>) {
        self.state().replies.push((needle.into(), MockReply::Error));
    }

    /// Get the number of times `complete` was called
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<ModelRequest> {
        self.state().requests.last().cloned()
    }

    /// Forget recorded requests
    pub fn reset(&self) {
        self.state().requests.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not poison the mock for the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"fields": {}}"#)
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, request: &ModelRequest) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.requests.push(request.clone());

        let reply = state
            .replies
            .iter()
            .find(|(needle, _)| request.user.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}
