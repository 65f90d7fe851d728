//! Multimodal extraction client for prescription images.
//!
//! This crate sends a prescription image and a fixed instruction to a hosted
//! generation service (Gemini by default) and hands the raw text to
//! `rx_extract_core` for normalization.

pub mod client;
pub mod config;
pub mod extraction;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod imaging;
pub mod pipeline;
pub mod prompts;

pub use client::{GenerationClient, GenerationRequest, MockGenerationClient, ServiceError};
pub use config::{ConfigError, GeminiConfig};
pub use extraction::{ExtractionClient, RawResponse};
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
pub use imaging::{EncodedImage, ImageError};
pub use pipeline::{PrescriptionError, PrescriptionParser, PrescriptionResult, ProcessedPrescription};
pub use prompts::*;
