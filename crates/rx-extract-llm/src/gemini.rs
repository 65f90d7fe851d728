//! Gemini `generateContent` backend over blocking HTTP.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::client::{GenerationClient, GenerationRequest, ServiceError};
use crate::config::GeminiConfig;

/// Header carrying the API key. Keeps the key out of URLs and logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Hosted Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ServiceError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_connect() {
            ServiceError::Connection(self.config.base_url.clone())
        } else if e.is_timeout() {
            ServiceError::Timeout(self.config.timeout_secs)
        } else {
            ServiceError::HttpClient(e.to_string())
        }
    }
}

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    /// Base64 image bytes
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn build_request<'a>(request: &GenerationRequest<'a>) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::Text {
                text: request.system_instruction,
            }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![
                Part::Text {
                    text: request.prompt,
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: request.image.mime_type,
                        data: request.image.to_base64(),
                    },
                },
            ],
        }],
    }
}

/// Error for a non-success status. A body that cannot be read is reported in its place.
fn status_error<E: fmt::Display>(status: u16, body: Result<String, E>) -> ServiceError {
    let body = body.unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    ServiceError::Status { status, body }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String, ServiceError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ServiceError::EmptyResponse(reason));
    };

    let texts: Vec<String> = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if texts.is_empty() {
        let reason = candidate
            .finish_reason
            .map(|r| format!("finish reason: {r}"))
            .unwrap_or_else(|| "candidate has no text".to_string());
        return Err(ServiceError::EmptyResponse(reason));
    }

    Ok(texts.concat())
}

impl GenerationClient for GeminiClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, ServiceError> {
        let _span = tracing::info_span!(
            "gemini_generate",
            model = %self.config.model,
            image_bytes = request.image.bytes.len(),
        )
        .entered();
        let start = Instant::now();

        let body = build_request(request);
        let response = self
            .http
            .post(self.config.generate_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Generation service returned an error status");
            return Err(status_error(status.as_u16(), response.text()));
        }

        let parsed: GenerateContentResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(self.config.timeout_secs)
            } else {
                ServiceError::ResponseParsing(e.to_string())
            }
        })?;
        let text = response_text(parsed)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            "Generation call complete"
        );

        Ok(text)
    }
}
