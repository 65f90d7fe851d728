//! Extraction client: one image in, raw service text out.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{GenerationClient, GenerationRequest, ServiceError};
use crate::imaging::EncodedImage;
use crate::prompts::{build_system_instruction, USER_PROMPT};

/// Raw text returned for one extraction request.
///
/// Owned by the caller; nothing about a request is kept on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResponse {
    pub request_id: Uuid,
    pub model: String,
    pub text: String,
    /// Digest of the uploaded image bytes
    pub image_sha256: String,
    /// RFC 3339 timestamp
    pub received_at: String,
}

/// Sends the fixed extraction instruction plus an image to a generation backend.
pub struct ExtractionClient {
    client: Arc<dyn GenerationClient>,
    system_instruction: String,
}

impl ExtractionClient {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            system_instruction: build_system_instruction(),
        }
    }

    /// The instruction sent with every request.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Run one generation call. No parsing, no retry.
    pub fn extract(&self, image: &EncodedImage) -> Result<RawResponse, ServiceError> {
        let request_id = Uuid::new_v4();
        let _span = tracing::info_span!(
            "extract_prescription",
            %request_id,
            model = %self.client.model(),
            image_sha256 = %image.sha256,
        )
        .entered();
        let start = Instant::now();

        let request = GenerationRequest {
            system_instruction: &self.system_instruction,
            prompt: USER_PROMPT,
            image,
        };

        let text = self.client.generate(&request).map_err(|e| {
            tracing::warn!(error = %e, "Generation service call failed");
            e
        })?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            "Received extraction response"
        );

        Ok(RawResponse {
            request_id,
            model: self.client.model().to_string(),
            text,
            image_sha256: image.sha256.clone(),
            received_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockGenerationClient;
    use image::{DynamicImage, GrayImage};

    fn sample_image() -> EncodedImage {
        EncodedImage::from_image(&DynamicImage::ImageLuma8(GrayImage::new(2, 2))).unwrap()
    }

    #[test]
    fn test_extract_returns_raw_text() {
        let mock = Arc::new(MockGenerationClient::new("Sure! {\"patient_name\":\"A\"}"));
        let extractor = ExtractionClient::new(mock.clone());
        let image = sample_image();

        let raw = extractor.extract(&image).unwrap();
        assert_eq!(raw.text, "Sure! {\"patient_name\":\"A\"}");
        assert_eq!(raw.model, "mock-model");
        assert_eq!(raw.image_sha256, image.sha256);
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_each_request_gets_its_own_response() {
        let extractor = ExtractionClient::new(Arc::new(MockGenerationClient::new("{}")));
        let image = sample_image();

        let first = extractor.extract(&image).unwrap();
        let second = extractor.extract(&image).unwrap();
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(first.image_sha256, second.image_sha256);
    }

    #[test]
    fn test_service_failure_is_not_retried() {
        let mock = Arc::new(MockGenerationClient::unavailable("http://localhost:1"));
        let extractor = ExtractionClient::new(mock.clone());

        let err = extractor.extract(&sample_image()).unwrap_err();
        assert!(matches!(err, ServiceError::Connection(_)));
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn test_instruction_is_fixed() {
        let extractor = ExtractionClient::new(Arc::new(MockGenerationClient::new("{}")));
        assert_eq!(extractor.system_instruction(), build_system_instruction());
    }
}
