//! Adaptive JPEG compression.
//!
//! [`CompressionEngine::compress`] turns one input image into a JPEG that fits
//! a tier's size ceiling, starting at the tier's quality and stepping down by
//! 0.05 until the output fits or the 0.10 floor is reached. The ceiling is a
//! soft target: the floor-quality encode is returned even when it is still too
//! large.
//!
//! Progress is reported through a callback:
//! - 10 right before a HEIC conversion starts
//! - `clamp(100 - size / ceiling * 100, 10, 100)` after each oversized encode
//! - 100 when the result is ready
//!
//! The per-iteration value is a size-ratio estimate and is not forced to be
//! monotonic.

use thiserror::Error;
use tracing::{debug, trace};

use crate::codec::{DefaultHeicConverter, HeicConverter, ImageCodec, NativeCodec};
use crate::decode::{ConversionError, DecodeError};
use crate::encode::EncodeError;
use crate::source::ImageFormat;
use crate::tier::{Quality, Tier};

/// Progress reported right before a HEIC conversion starts.
pub const PROGRESS_CONVERTING: u8 = 10;

/// Lowest progress reported while the search is still running.
pub const PROGRESS_MIN: u8 = 10;

/// Progress reported with the final result.
pub const PROGRESS_DONE: u8 = 100;

/// Default quality for the HEIC to JPEG conversion step.
pub const DEFAULT_HEIC_QUALITY_PERCENT: u8 = 90;

/// Terminal failures of one compression run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// HEIC input could not be converted; nothing was decoded.
    #[error("Conversion failed: {0}")]
    ConversionFailed(#[from] ConversionError),

    /// The (possibly converted) input could not be decoded.
    #[error("Decode failed: {0}")]
    DecodeFailed(#[from] DecodeError),

    /// The encoder rejected the bitmap.
    #[error("Encode failed: {0}")]
    EncodeFailed(#[from] EncodeError),

    /// The run ended without a result (its worker panicked or was cancelled).
    #[error("Compression aborted: {0}")]
    Aborted(String),
}

impl EngineError {
    /// Stable name of the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ConversionFailed(_) => "ConversionFailed",
            EngineError::DecodeFailed(_) => "DecodeFailed",
            EngineError::EncodeFailed(_) => "EncodeFailed",
            EngineError::Aborted(_) => "Aborted",
        }
    }
}

/// Output of a successful compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    /// JPEG bytes.
    pub bytes: Vec<u8>,
    /// Quality of the returned encode.
    pub quality: Quality,
    /// Tier the run targeted.
    pub tier: Tier,
    /// Number of encodes performed.
    pub iterations: usize,
}

impl CompressedImage {
    /// True when the output is within the tier's ceiling.
    pub fn fits_ceiling(&self) -> bool {
        fits(self.bytes.len(), self.tier.preset().size_ceiling)
    }
}

fn fits(size: usize, ceiling: u32) -> bool {
    (size as u64) <= u64::from(ceiling)
}

/// Percentage saved relative to the original, rounded. Negative when the
/// output grew. `None` for an empty original.
pub fn savings_percent(original: usize, compressed: usize) -> Option<i64> {
    if original == 0 {
        return None;
    }
    let ratio = compressed as f64 / original as f64;
    Some(((1.0 - ratio) * 100.0).round() as i64)
}

/// Progress estimate for an encode that came out at `size` bytes.
pub fn progress_for_size(size: usize, ceiling: u32) -> u8 {
    if ceiling == 0 {
        return PROGRESS_MIN;
    }
    let estimate = 100.0 - (size as f64 / f64::from(ceiling)) * 100.0;
    estimate.clamp(f64::from(PROGRESS_MIN), f64::from(PROGRESS_DONE)) as u8
}

/// Quality search over an [`ImageCodec`], with HEIC conversion up front.
///
/// The engine holds no mutable state; one instance can serve any number of
/// concurrent runs as long as its collaborators are shareable.
#[derive(Debug, Clone)]
pub struct CompressionEngine<C = NativeCodec, H = DefaultHeicConverter> {
    codec: C,
    heic: H,
    heic_quality: Quality,
}

impl CompressionEngine {
    /// Engine with the native codec and the default HEIC converter.
    pub fn new() -> Self {
        Self::with_collaborators(NativeCodec, DefaultHeicConverter::default())
    }
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ImageCodec, H: HeicConverter> CompressionEngine<C, H> {
    /// Engine over the given codec and HEIC converter.
    pub fn with_collaborators(codec: C, heic: H) -> Self {
        Self {
            codec,
            heic,
            heic_quality: Quality::from_percent(DEFAULT_HEIC_QUALITY_PERCENT),
        }
    }

    /// Override the quality used for HEIC conversion.
    pub fn with_heic_quality(mut self, quality: Quality) -> Self {
        self.heic_quality = quality;
        self
    }

    /// Compress one image for `tier`.
    ///
    /// `format` is the declared input format; HEIC input goes through the
    /// converter before decoding. `on_progress` receives values in 10..=100
    /// in the order the search produces them, ending with 100 on success.
    pub fn compress<F>(
        &self,
        bytes: &[u8],
        format: ImageFormat,
        tier: Tier,
        mut on_progress: F,
    ) -> Result<CompressedImage, EngineError>
    where
        F: FnMut(u8),
    {
        let preset = tier.preset();

        let converted;
        let (input, decode_format) = if format == ImageFormat::Heic {
            on_progress(PROGRESS_CONVERTING);
            debug!(quality = %self.heic_quality, "Converting HEIC input");
            converted = self.heic.convert_to_jpeg(bytes, self.heic_quality)?;
            (converted.as_slice(), ImageFormat::Jpeg)
        } else {
            (bytes, format)
        };

        let bitmap = self.codec.decode(input, decode_format)?;
        trace!(width = bitmap.width, height = bitmap.height, "Decoded input");

        let mut quality = preset.initial_quality;
        let mut iterations = 0;
        loop {
            let encoded = self.codec.encode_jpeg(&bitmap, quality)?;
            iterations += 1;
            let size = encoded.len();
            trace!(%quality, size, ceiling = preset.size_ceiling, "Encoded attempt");

            let fits = fits(size, preset.size_ceiling);
            if fits || quality.is_at_floor() {
                on_progress(PROGRESS_DONE);
                debug!(
                    %tier,
                    %quality,
                    size,
                    iterations,
                    fits,
                    "Compression finished"
                );
                return Ok(CompressedImage {
                    bytes: encoded,
                    quality,
                    tier,
                    iterations,
                });
            }

            quality = quality.step_down();
            on_progress(progress_for_size(size, preset.size_ceiling));
        }
    }
}
