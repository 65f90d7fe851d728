//! End-to-end pipeline: image → raw text → [`PrescriptionRecord`].

use std::path::Path;
use std::sync::Arc;

use rx_extract_core::normalizer::{normalize_response, NormalizeError};
use rx_extract_core::PrescriptionRecord;
use thiserror::Error;

use crate::client::{GenerationClient, ServiceError};
use crate::extraction::{ExtractionClient, RawResponse};
use crate::imaging::{EncodedImage, ImageError};

/// Terminal failures for one prescription request.
#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Generation service unavailable: {0}")]
    ServiceUnavailable(#[from] ServiceError),

    #[error("No JSON found in response")]
    NoJsonFound,

    #[error("Extracted text is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("JSON does not match the prescription schema: {0}")]
    SchemaViolation(serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

impl From<NormalizeError> for PrescriptionError {
    fn from(e: NormalizeError) -> Self {
        match e {
            NormalizeError::NoJsonFound => PrescriptionError::NoJsonFound,
            NormalizeError::InvalidJson(e) => PrescriptionError::InvalidJson(e),
            NormalizeError::SchemaViolation(e) => PrescriptionError::SchemaViolation(e),
        }
    }
}

impl PrescriptionError {
    /// Short message suitable for showing to the person who uploaded the image.
    pub fn user_message(&self) -> &'static str {
        match self {
            PrescriptionError::ServiceUnavailable(_) => {
                "The extraction service could not be reached. Please try again."
            }
            PrescriptionError::NoJsonFound => {
                "No prescription details were found in the response. Please re-upload a clearer image."
            }
            PrescriptionError::InvalidJson(_) | PrescriptionError::SchemaViolation(_) => {
                "The extracted details could not be read. Please re-upload the image."
            }
            PrescriptionError::Image(_) => "The image could not be opened. Please upload a PNG or JPEG.",
        }
    }
}

pub type PrescriptionResult<T> = Result<T, PrescriptionError>;

/// A normalized record together with the raw response it came from.
#[derive(Debug, Clone)]
pub struct ProcessedPrescription {
    pub record: PrescriptionRecord,
    pub raw: RawResponse,
}

/// Runs the extraction client and the record normalizer in sequence.
pub struct PrescriptionParser {
    extractor: ExtractionClient,
}

impl PrescriptionParser {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            extractor: ExtractionClient::new(client),
        }
    }

    pub fn extractor(&self) -> &ExtractionClient {
        &self.extractor
    }

    /// Step 1 only: fetch raw text for an image.
    pub fn extract(&self, image: &EncodedImage) -> PrescriptionResult<RawResponse> {
        self.extractor.extract(image).map_err(PrescriptionError::from)
    }

    /// Step 2 only: normalize a previously fetched response.
    pub fn normalize(&self, raw: &RawResponse) -> PrescriptionResult<PrescriptionRecord> {
        normalize_response(&raw.text).map_err(|e| {
            tracing::warn!(request_id = %raw.request_id, error = %e, "Normalization failed");
            PrescriptionError::from(e)
        })
    }

    /// Full pipeline for an encoded image.
    pub fn process(&self, image: &EncodedImage) -> PrescriptionResult<ProcessedPrescription> {
        let raw = self.extract(image)?;
        let record = self.normalize(&raw)?;

        tracing::info!(
            request_id = %raw.request_id,
            medications = record.medication_count(),
            missing_fields = record.missing_fields().len(),
            "Prescription processed"
        );

        Ok(ProcessedPrescription { record, raw })
    }

    /// Full pipeline starting from an image file.
    pub fn process_path<P: AsRef<Path>>(&self, path: P) -> PrescriptionResult<ProcessedPrescription> {
        let image = EncodedImage::from_path(path)?;
        self.process(&image)
    }
}
