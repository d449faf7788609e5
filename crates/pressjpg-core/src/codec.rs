//! Decode/encode and HEIC conversion seams used by the compression engine.
//!
//! The engine only talks to these traits. [`NativeCodec`] backs them with the
//! `image` crate; tests substitute scripted codecs to control output sizes.

use std::sync::Arc;

use crate::decode::{self, ConversionError, DecodeError, DecodedImage};
use crate::encode::{self, EncodeError};
use crate::source::ImageFormat;
use crate::tier::Quality;

/// Decodes input files into bitmaps and encodes bitmaps to JPEG.
///
/// `encode_jpeg` is called repeatedly on the same bitmap at decreasing
/// qualities and must not require a fresh decode.
pub trait ImageCodec {
    /// Decode `bytes` into an RGB bitmap. `format` is the declared format.
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError>;

    /// Encode the bitmap as a JPEG at `quality`.
    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, EncodeError>;
}

/// Turns HEIC bytes into JPEG bytes the [`ImageCodec`] can decode.
pub trait HeicConverter {
    fn convert_to_jpeg(&self, bytes: &[u8], quality: Quality) -> Result<Vec<u8>, ConversionError>;
}

impl<T: ImageCodec + ?Sized> ImageCodec for &T {
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError> {
        (**self).decode(bytes, format)
    }

    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        (**self).encode_jpeg(image, quality)
    }
}

impl<T: HeicConverter + ?Sized> HeicConverter for &T {
    fn convert_to_jpeg(&self, bytes: &[u8], quality: Quality) -> Result<Vec<u8>, ConversionError> {
        (**self).convert_to_jpeg(bytes, quality)
    }
}

impl<T: ImageCodec + ?Sized> ImageCodec for Arc<T> {
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError> {
        (**self).decode(bytes, format)
    }

    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        (**self).encode_jpeg(image, quality)
    }
}

impl<T: HeicConverter + ?Sized> HeicConverter for Arc<T> {
    fn convert_to_jpeg(&self, bytes: &[u8], quality: Quality) -> Result<Vec<u8>, ConversionError> {
        (**self).convert_to_jpeg(bytes, quality)
    }
}

/// Codec backed by the `image` crate (JPEG, PNG and WebP input).
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl ImageCodec for NativeCodec {
    fn decode(&self, bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError> {
        decode::decode_image(bytes, Some(format))
    }

    fn encode_jpeg(&self, image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        encode::encode_image(image, quality)
    }
}

/// Converter for builds without HEIC support; every conversion fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeicSupport;

impl HeicConverter for NoHeicSupport {
    fn convert_to_jpeg(&self, _bytes: &[u8], _quality: Quality) -> Result<Vec<u8>, ConversionError> {
        Err(ConversionError::Unavailable)
    }
}

/// libheif-backed converter.
#[cfg(feature = "heic")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibheifConverter;

#[cfg(feature = "heic")]
impl HeicConverter for LibheifConverter {
    fn convert_to_jpeg(&self, bytes: &[u8], quality: Quality) -> Result<Vec<u8>, ConversionError> {
        decode::convert_heic_to_jpeg(bytes, quality)
    }
}

/// The converter used when none is specified: libheif when the `heic`
/// feature is enabled, otherwise [`NoHeicSupport`].
#[cfg(feature = "heic")]
pub type DefaultHeicConverter = LibheifConverter;

/// The converter used when none is specified: libheif when the `heic`
/// feature is enabled, otherwise [`NoHeicSupport`].
#[cfg(not(feature = "heic"))]
pub type DefaultHeicConverter = NoHeicSupport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_codec_roundtrip_dimensions() {
        let image = DecodedImage::new(8, 6, vec![200u8; 8 * 6 * 3]);
        let jpeg = NativeCodec.encode_jpeg(&image, Quality::from_percent(80)).unwrap();
        let decoded = NativeCodec.decode(&jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width, decoded.height), (8, 6));
    }

    #[test]
    fn test_native_codec_decode_error() {
        let result = NativeCodec.decode(b"garbage", ImageFormat::Png);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_heic_support() {
        let result = NoHeicSupport.convert_to_jpeg(b"ftypheic", Quality::from_percent(90));
        assert_eq!(result, Err(ConversionError::Unavailable));
    }
}
