//! Image loading and upload encoding.
//!
//! Images reach the generation service as plain color: anything carrying an
//! alpha channel (RGBA, grayscale+alpha, palettes with transparency) is
//! flattened to RGB first. Plain RGB and plain grayscale pass unchanged.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, ImageReader};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// File extensions accepted for upload.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Image loading errors.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Could not read image {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("Unsupported image type: {0} (expected png, jpg or jpeg)")]
    UnsupportedType(String),
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Check a path's extension against [`ACCEPTED_EXTENSIONS`] (case-insensitive).
pub fn is_accepted_extension<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            ACCEPTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Load an image from disk and convert it to plain color.
pub fn load_image<P: AsRef<Path>>(path: P) -> ImageResult<DynamicImage> {
    let path = path.as_ref();
    if !is_accepted_extension(path) {
        return Err(ImageError::UnsupportedType(path.display().to_string()));
    }

    let io_err = |source: std::io::Error| ImageError::Io {
        path: path.display().to_string(),
        source,
    };
    let img = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?
        .decode()?;

    Ok(to_plain_color(img))
}

/// Decode in-memory image bytes and convert to plain color.
pub fn decode_image(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(to_plain_color(img))
}

/// Drop any alpha channel by converting to 8-bit RGB.
pub fn to_plain_color(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    }
}

/// An image encoded for upload, with a digest of the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Hex SHA-256 of `bytes`
    pub sha256: String,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Encode a decoded image as PNG, flattening alpha if still present.
    pub fn from_image(img: &DynamicImage) -> ImageResult<Self> {
        let flattened;
        let img = if img.color().has_alpha() {
            flattened = DynamicImage::ImageRgb8(img.to_rgb8());
            &flattened
        } else {
            img
        };

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        Ok(Self {
            sha256: sha256_hex(&bytes),
            bytes,
            mime_type: "image/png",
            width: img.width(),
            height: img.height(),
        })
    }

    /// Load, flatten and encode an image file in one step.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImageResult<Self> {
        let img = load_image(path)?;
        Self::from_image(&img)
    }

    /// Base64 (standard alphabet) of the encoded bytes, as the service expects.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
