//! JPEG encoding for compression output.
//!
//! Uses the `image` crate's baseline JPEG encoder. The same bitmap is
//! re-encoded at decreasing qualities during the size search, so these
//! functions never consume or modify their input.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use thiserror::Error;

use crate::decode::DecodedImage;
use crate::tier::Quality;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode a raw RGB buffer (row-major, 3 bytes per pixel) as a JPEG.
///
/// Takes plain pixels rather than a [`DecodedImage`] so the HEIC conversion
/// path can hand over libheif's interleaved plane without building a bitmap
/// first. `quality` is a percent; values outside 1-100 are clamped.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let len = check_layout(pixels, width, height)?;

    let mut out = Vec::with_capacity(len / 8);
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(out)
}

fn check_layout(pixels: &[u8], width: u32, height: u32) -> Result<usize, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 3;
    if pixels.len() == expected {
        Ok(expected)
    } else {
        Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        })
    }
}

/// Encode a decoded bitmap at the given quality.
pub fn encode_image(image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg(&image.pixels, image.width, image.height, quality.percent())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width) as u8);
                pixels.push((y * 255 / height) as u8);
                pixels.push(((x ^ y) & 0xFF) as u8);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let jpeg = encode_jpeg(&vec![128u8; 100 * 100 * 3], 100, 100, 90).unwrap();

        // SOI at the start, EOI at the end
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_image_lower_quality_is_smaller() {
        let image = gradient(128, 128);
        let high = encode_image(&image, Quality::from_percent(90)).unwrap();
        let low = encode_image(&image, Quality::from_percent(10)).unwrap();
        assert!(low.len() < high.len(), "low={} high={}", low.len(), high.len());
    }

    #[test]
    fn test_encode_image_does_not_modify_input() {
        let image = gradient(16, 16);
        let before = image.clone();
        encode_image(&image, Quality::from_percent(50)).unwrap();
        encode_image(&image, Quality::from_percent(45)).unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let pixels = vec![128u8; 10 * 10 * 3];
        assert!(encode_jpeg(&pixels, 10, 10, 0).is_ok());
        assert!(encode_jpeg(&pixels, 10, 10, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let pixels = vec![128u8; 99 * 100 * 3]; // One row short
        let result = encode_jpeg(&pixels, 100, 100, 90);
        assert_eq!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 30_000,
                actual: 29_700
            })
        );
    }

    #[test]
    fn test_encode_jpeg_zero_dimensions() {
        assert!(matches!(
            encode_jpeg(&[], 0, 100, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_jpeg(&[], 100, 0, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
