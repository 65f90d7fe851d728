//! Generation service client seam.

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::imaging::EncodedImage;

/// Failures talking to the generation service.
///
/// Every variant is reported to callers as `ServiceUnavailable`; the variants
/// only refine the message.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Cannot connect to generation service at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Generation service error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Unreadable service response: {0}")]
    ResponseParsing(String),

    #[error("Service returned no text ({0})")]
    EmptyResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// One extraction request: instruction, user prompt and the image.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub system_instruction: &'a str,
    pub prompt: &'a str,
    pub image: &'a EncodedImage,
}

/// A multimodal text-generation backend.
///
/// Implementations hold configuration only. One call, no retries.
pub trait GenerationClient: Send + Sync {
    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Send the request and return the raw response text.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ServiceError>;
}

/// Mock client for testing. Returns a configured reply.
pub struct MockGenerationClient {
    reply: Result<String, String>,
    model: String,
    calls: AtomicUsize,
}

impl MockGenerationClient {
    /// Mock that always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            reply: Ok(response.to_string()),
            model: "mock-model".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock whose every call fails with a connection error.
    pub fn unavailable(endpoint: &str) -> Self {
        Self {
            reply: Err(endpoint.to_string()),
            model: "mock-model".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GenerationClient for MockGenerationClient {
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(endpoint) => Err(ServiceError::Connection(endpoint.clone())),
        }
    }
}
