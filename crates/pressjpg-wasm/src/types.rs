//! WASM-compatible wrapper types for compression results.

use pressjpg_core::{CompressedImage, Tier};
use wasm_bindgen::prelude::*;

/// A compressed JPEG and how it was produced.
///
/// The bytes live in WASM memory; `bytes()` copies them out as a
/// `Uint8Array`.
#[wasm_bindgen]
pub struct JsCompressedImage {
    bytes: Vec<u8>,
    quality: f32,
    tier: Tier,
    iterations: usize,
    fits_ceiling: bool,
    file_name: String,
}

#[wasm_bindgen]
impl JsCompressedImage {
    /// JPEG quality of the returned encode, in (0, 1]
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Tier label, e.g. `verysmall`
    #[wasm_bindgen(getter)]
    pub fn tier(&self) -> String {
        self.tier.label().to_string()
    }

    /// Number of encodes the search performed
    #[wasm_bindgen(getter)]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// False when the quality floor was reached without getting under the
    /// tier's size ceiling.
    #[wasm_bindgen(getter)]
    pub fn fits_ceiling(&self) -> bool {
        self.fits_ceiling
    }

    /// Suggested download name, `{base}_{tier}.jpg`
    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the JPEG bytes as a Uint8Array (copied).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl JsCompressedImage {
    pub(crate) fn from_compressed(image: CompressedImage, file_name: String) -> Self {
        let fits_ceiling = image.fits_ceiling();
        Self {
            quality: image.quality.as_fraction(),
            tier: image.tier,
            iterations: image.iterations,
            fits_ceiling,
            file_name,
            bytes: image.bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressjpg_core::Quality;

    #[test]
    fn test_from_compressed() {
        let image = CompressedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            quality: Quality::from_percent(35),
            tier: Tier::VerySmall,
            iterations: 2,
        };
        let js = JsCompressedImage::from_compressed(image, "cat_verysmall.jpg".to_string());

        assert_eq!(js.quality(), 0.35);
        assert_eq!(js.tier(), "verysmall");
        assert_eq!(js.iterations(), 2);
        assert!(js.fits_ceiling());
        assert_eq!(js.file_name(), "cat_verysmall.jpg");
        assert_eq!(js.byte_length(), 4);
        assert_eq!(js.bytes(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }
}
