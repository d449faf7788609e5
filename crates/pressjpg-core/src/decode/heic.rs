//! HEIC to JPEG conversion.
//!
//! The `image` crate cannot read HEIC, so HEIC input is first converted into a
//! JPEG that the regular decode path understands. Native conversion needs the
//! `heic` feature, which links against libheif.

use thiserror::Error;

/// Errors from the HEIC conversion step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No converter is available in this build.
    #[error("HEIC conversion is not available in this build")]
    Unavailable,

    /// The container could not be read or the primary image decoded.
    #[error("Failed to read HEIC: {0}")]
    ReadFailed(String),

    /// The converted bitmap could not be re-encoded as JPEG.
    #[error("Failed to encode converted HEIC: {0}")]
    EncodeFailed(String),

    /// An external converter reported an error.
    #[error("HEIC converter failed: {0}")]
    Converter(String),
}

/// Convert HEIC bytes to JPEG bytes at the given quality using libheif.
#[cfg(feature = "heic")]
pub fn convert_heic_to_jpeg(
    bytes: &[u8],
    quality: crate::tier::Quality,
) -> Result<Vec<u8>, ConversionError> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes)
        .map_err(|e| ConversionError::ReadFailed(e.to_string()))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ConversionError::ReadFailed(format!("no primary image: {}", e)))?;

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| ConversionError::ReadFailed(e.to_string()))?;

    let width = handle.width();
    let height = handle.height();
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ConversionError::ReadFailed("no RGB plane found".to_string()))?;

    // Rows may be padded; copy out exactly width * 3 bytes per row
    let row_len = width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in plane.data.chunks(plane.stride).take(height as usize) {
        let row = row
            .get(..row_len)
            .ok_or_else(|| ConversionError::ReadFailed("short RGB row".to_string()))?;
        pixels.extend_from_slice(row);
    }

    crate::encode::encode_jpeg(&pixels, width, height, quality.percent())
        .map_err(|e| ConversionError::EncodeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        assert_eq!(
            ConversionError::Unavailable.to_string(),
            "HEIC conversion is not available in this build"
        );
        assert_eq!(
            ConversionError::ReadFailed("bad ftyp".to_string()).to_string(),
            "Failed to read HEIC: bad ftyp"
        );
    }

    #[cfg(feature = "heic")]
    #[test]
    fn test_convert_garbage_fails() {
        let result = convert_heic_to_jpeg(b"not a heic file", crate::tier::Quality::from_percent(90));
        assert!(matches!(result, Err(ConversionError::ReadFailed(_))));
    }
}
