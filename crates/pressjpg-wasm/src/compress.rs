//! Compression WASM bindings.
//!
//! # Functions
//!
//! - [`compress_image`] - Compress one file for a tier
//! - [`JsCompressor`] - Holds settings (tier, HEIC quality) across calls
//!
//! # Example
//!
//! ```typescript
//! import { JsCompressor } from '@pressjpg/wasm';
//!
//! const compressor = new JsCompressor({ tier: 'small' });
//! const result = compressor.compress(bytes, file.type, file.name, (p) => bar.value = p);
//! compressor.set_tier('large');
//! ```

use js_sys::Function;
use pressjpg_core::{
    output_file_name, CompressionEngine, CompressorConfig, NativeCodec, SourceImage, Tier,
};
use wasm_bindgen::prelude::*;

use crate::heic::JsHeicConverter;
use crate::types::JsCompressedImage;

/// Compress an image for a tier.
///
/// # Arguments
///
/// * `bytes` - Raw file contents (JPEG, PNG, WebP or HEIC)
/// * `mime_type` - Declared MIME type (`file.type`, may be empty)
/// * `name` - Original file name, used for validation and the output name
/// * `tier` - `large`, `medium`, `small` or `very_small`
/// * `on_progress` - Optional `(percent: number) => void`
/// * `heic_converter` - Optional synchronous `(bytes, quality) => Uint8Array`
///
/// # Errors
///
/// Returns an error if the tier is unknown, the file type is unsupported, or
/// conversion, decoding or encoding fails.
#[wasm_bindgen]
pub fn compress_image(
    bytes: &[u8],
    mime_type: &str,
    name: &str,
    tier: &str,
    on_progress: Option<Function>,
    heic_converter: Option<Function>,
) -> Result<JsCompressedImage, JsValue> {
    let tier = tier
        .parse::<Tier>()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let config = CompressorConfig::default().with_tier(tier);
    run(&config, bytes, mime_type, name, on_progress, heic_converter)
}

/// Compressor with persistent settings.
#[wasm_bindgen]
pub struct JsCompressor {
    config: CompressorConfig,
}

#[wasm_bindgen]
impl JsCompressor {
    /// Create a compressor from a settings object (`undefined` for defaults).
    ///
    /// Recognised fields: `tier`, `autoDownload`, `downloadStaggerMs`,
    /// `heicConversionQuality`.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<JsCompressor, JsValue> {
        let config = crate::tiers::config_from_js(settings)?;
        Ok(Self { config })
    }

    /// Current tier label
    #[wasm_bindgen(getter)]
    pub fn tier(&self) -> String {
        self.config.tier.label().to_string()
    }

    /// Set the tier used by subsequent calls.
    pub fn set_tier(&mut self, tier: &str) -> Result<(), JsValue> {
        self.config.tier = tier
            .parse::<Tier>()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Whether the page should download each result as soon as it is ready
    #[wasm_bindgen(getter)]
    pub fn auto_download(&self) -> bool {
        self.config.auto_download
    }

    /// Milliseconds to wait between files when downloading everything
    #[wasm_bindgen(getter)]
    pub fn download_stagger_ms(&self) -> f64 {
        self.config.download_stagger_ms as f64
    }

    /// Compress one file with the current settings.
    pub fn compress(
        &self,
        bytes: &[u8],
        mime_type: &str,
        name: &str,
        on_progress: Option<Function>,
        heic_converter: Option<Function>,
    ) -> Result<JsCompressedImage, JsValue> {
        run(&self.config, bytes, mime_type, name, on_progress, heic_converter)
    }
}

fn run(
    config: &CompressorConfig,
    bytes: &[u8],
    mime_type: &str,
    name: &str,
    on_progress: Option<Function>,
    heic_converter: Option<Function>,
) -> Result<JsCompressedImage, JsValue> {
    let source = SourceImage::new(name, mime_type, bytes.to_vec());
    let format = source
        .compression_format()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let engine = CompressionEngine::with_collaborators(NativeCodec, JsHeicConverter::new(heic_converter))
        .with_heic_quality(config.heic_quality());

    let report = |percent: u8| {
        if let Some(callback) = &on_progress {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from(percent)) {
                web_sys::console::warn_2(&"pressjpg: progress callback threw".into(), &err);
            }
        }
    };

    let compressed = engine
        .compress(source.bytes(), format, config.tier, report)
        .map_err(|e| {
            let message = format!("{} ({})", e, name);
            web_sys::console::warn_1(&message.clone().into());
            JsValue::from_str(&message)
        })?;

    Ok(JsCompressedImage::from_compressed(
        compressed,
        output_file_name(name, config.tier),
    ))
}

/// Compression tests need `JsValue`, so they only run on wasm32 targets.
/// The engine itself is covered by `pressjpg_core::engine` tests.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn png_bytes() -> Vec<u8> {
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10])))
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        png.into_inner()
    }

    #[wasm_bindgen_test]
    fn test_compress_png() {
        let result = compress_image(&png_bytes(), "image/png", "red.png", "small", None, None).unwrap();
        assert_eq!(result.file_name(), "red_small.jpg");
        assert_eq!(result.quality(), 0.6);
        assert_eq!(&result.bytes()[0..2], &[0xFF, 0xD8]);
    }

    #[wasm_bindgen_test]
    fn test_compress_reports_progress() {
        let seen = js_sys::Array::new();
        let push = Function::new_with_args("p", "this.push(p);").bind(&seen);
        compress_image(&png_bytes(), "", "red.png", "large", Some(push), None).unwrap();
        assert_eq!(seen.length(), 1);
        assert_eq!(seen.get(0).as_f64(), Some(100.0));
    }

    #[wasm_bindgen_test]
    fn test_compress_rejects_unsupported() {
        assert!(compress_image(b"GIF89a", "image/gif", "a.gif", "small", None, None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_compress_unknown_tier() {
        assert!(compress_image(&png_bytes(), "image/png", "a.png", "huge", None, None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_heic_without_converter_fails() {
        assert!(compress_image(b"heic", "image/heic", "a.heic", "small", None, None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_compressor_tier_setter() {
        let mut compressor = JsCompressor::new(JsValue::UNDEFINED).unwrap();
        assert_eq!(compressor.tier(), "medium");
        compressor.set_tier("very small").unwrap();
        assert_eq!(compressor.tier(), "verysmall");
        assert!(compressor.set_tier("tiny").is_err());

        let result = compressor.compress(&png_bytes(), "image/png", "x.png", None, None).unwrap();
        assert_eq!(result.file_name(), "x_verysmall.jpg");
    }
}
