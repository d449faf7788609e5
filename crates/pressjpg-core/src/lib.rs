//! PressJPG Core - image compression library
//!
//! Compresses JPEG, PNG, WebP and HEIC images into JPEGs that fit one of four
//! size tiers, by searching downward over JPEG quality. The [`batch`] module
//! keeps a set of images compressed for the currently selected tier and
//! delivers the results.

pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod engine;
pub mod import;
pub mod source;
pub mod tier;

#[cfg(feature = "batch")]
pub mod batch;

pub use codec::{DefaultHeicConverter, HeicConverter, ImageCodec, NativeCodec, NoHeicSupport};
pub use config::{CompressorConfig, ConfigError};
pub use engine::{savings_percent, CompressedImage, CompressionEngine, EngineError};
pub use import::ImageUrl;
pub use source::{is_supported, output_file_name, ImageFormat, SourceImage, ValidationError};
pub use tier::{ParseTierError, Quality, Tier, TierPreset};

#[cfg(feature = "heic")]
pub use codec::LibheifConverter;
