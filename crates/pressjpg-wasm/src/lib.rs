//! PressJPG WASM - WebAssembly bindings for PressJPG
//!
//! This crate exposes the pressjpg-core compression engine to a browser
//! presentation layer. Compression is synchronous and CPU bound, so call it
//! from a Web Worker; batching, tier switching and downloads are driven from
//! JavaScript on top of these bindings.
//!
//! # Module Structure
//!
//! - `compress` - One-shot compression and the configurable `JsCompressor`
//! - `heic` - Adapter that lets a JS function act as the HEIC converter
//! - `files` - File validation, output naming, URL checks and size formatting
//! - `tiers` - The tier table as plain JS objects
//! - `types` - WASM-compatible wrapper for compression results
//!
//! # Usage
//!
//! ```typescript
//! import init, { compress_image } from '@pressjpg/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = compress_image(bytes, file.type, file.name, 'small', (p) => setProgress(p));
//! console.log(`${result.file_name}: ${result.byte_length} bytes at q=${result.quality}`);
//! ```

use wasm_bindgen::prelude::*;

mod compress;
mod files;
mod heic;
mod tiers;
mod types;

pub use compress::{compress_image, JsCompressor};
pub use files::{format_file_size, is_supported_image, output_file_name, savings_percent, validate_image_url};
pub use tiers::{parse_config, tier_presets};
pub use types::JsCompressedImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
