//! Image decoding pipeline for pressjpg.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG and WebP images into RGB bitmaps
//! - Applying EXIF orientation so the output JPEG displays upright
//! - Converting HEIC input to JPEG before decoding (`heic` feature)
//!
//! # Architecture
//!
//! A bitmap is decoded once per compression run and then re-encoded at each
//! quality step, so decode cost is paid once regardless of how many
//! iterations the search needs.
//!
//! # Examples
//!
//! ```ignore
//! use pressjpg_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let image = decode_image(&bytes, None).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod bitmap;
mod heic;
mod types;

pub use bitmap::{decode_image, read_orientation};
#[cfg(feature = "heic")]
pub use heic::convert_heic_to_jpeg;
pub use heic::ConversionError;
pub use types::{DecodeError, DecodedImage, Orientation};
