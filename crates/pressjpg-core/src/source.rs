//! Input images and the supported-format check.
//!
//! A file is accepted when either its declared MIME type or its file extension
//! names a supported format. Browsers often report an empty MIME type for HEIC
//! files, so requiring both would reject valid input.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tier::Tier;

/// Errors raised before any compression starts.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationError {
    /// Neither the MIME type nor the extension is supported.
    #[error("Unsupported file {name:?} ({mime}): only JPEG, PNG, WebP and HEIC images are accepted")]
    UnsupportedFile { name: String, mime: String },

    /// A pasted URL does not point at a supported image.
    #[error("Not a valid image URL (jpg, jpeg, png, webp, heic): {0}")]
    InvalidUrl(String),
}

/// Input formats the engine knows how to turn into JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Heic,
}

impl ImageFormat {
    /// Resolve a format from a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::Webp),
            "image/heic" => Some(ImageFormat::Heic),
            _ => None,
        }
    }

    /// Resolve a format from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "heic" => Some(ImageFormat::Heic),
            _ => None,
        }
    }

    /// Resolve a format from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    /// Resolve a declared file: MIME type first, extension as fallback.
    pub fn resolve(mime: &str, name: &str) -> Option<Self> {
        Self::from_mime(mime).or_else(|| Self::from_file_name(name))
    }

    /// Detect the format from the leading bytes of the file.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }
        // HEIF files are ISO-BMFF containers starting with an `ftyp` box
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            let brand = &bytes[8..12];
            if matches!(
                brand,
                b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1" | b"msf1"
            ) {
                return Some(ImageFormat::Heic);
            }
        }
        None
    }

    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Heic => "image/heic",
        }
    }

    /// The `image` crate format used for decoding, if it has one.
    pub(crate) fn to_image_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Webp => Some(image::ImageFormat::WebP),
            ImageFormat::Heic => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// True when a file would be accepted for compression.
pub fn is_supported(mime: &str, name: &str) -> bool {
    ImageFormat::resolve(mime, name).is_some()
}

/// Name for a compressed result: `{base}_{tier label}.jpg`.
///
/// Only the last extension is stripped, so `archive.tar.png` becomes
/// `archive.tar_small.jpg`. An empty name falls back to `compressed`.
pub fn output_file_name(original_name: &str, tier: Tier) -> String {
    let base = match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') => stem,
        _ => original_name,
    };
    let base = if base.is_empty() { "compressed" } else { base };
    format!("{}_{}.jpg", base, tier.label())
}

/// An image handed over for compression.
///
/// Immutable once created. The bytes are reference counted so that several
/// in-flight compression runs can read them without copying.
#[derive(Debug, Clone)]
pub struct SourceImage {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    /// Wrap raw bytes with the declared MIME type and display name.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Display name, usually the original file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type declared by whoever supplied the file (may be empty).
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Raw file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the raw bytes.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Size of the original file in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length file.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check the file against the supported set and return its format.
    pub fn validate(&self) -> Result<ImageFormat, ValidationError> {
        ImageFormat::resolve(&self.mime_type, &self.name).ok_or_else(|| {
            ValidationError::UnsupportedFile {
                name: self.name.clone(),
                mime: if self.mime_type.is_empty() {
                    "unknown type".to_string()
                } else {
                    self.mime_type.clone()
                },
            }
        })
    }

    /// True when either the MIME type or the extension says HEIC.
    pub fn is_heic(&self) -> bool {
        ImageFormat::from_mime(&self.mime_type) == Some(ImageFormat::Heic)
            || ImageFormat::from_file_name(&self.name) == Some(ImageFormat::Heic)
    }

    /// Format handed to the engine: HEIC whenever either hint says so,
    /// otherwise the validated format.
    pub fn compression_format(&self) -> Result<ImageFormat, ValidationError> {
        let format = self.validate()?;
        Ok(if self.is_heic() { ImageFormat::Heic } else { format })
    }
}
