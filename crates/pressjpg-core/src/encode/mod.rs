//! Image encoding pipeline for pressjpg.
//!
//! This module provides functionality for:
//! - Encoding RGB bitmaps to JPEG format with configurable quality
//!
//! # Architecture
//!
//! Encoding is synchronous and CPU bound. The batch orchestrator runs each
//! compression on the blocking pool; the WASM bindings call it directly from
//! a Web Worker.
//!
//! # Examples
//!
//! ```ignore
//! use pressjpg_core::encode::encode_jpeg;
//!
//! let pixels = vec![128u8; 100 * 100 * 3]; // Gray image
//! let jpeg_bytes = encode_jpeg(&pixels, 100, 100, 80).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError};
