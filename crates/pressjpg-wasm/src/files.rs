//! File-level helpers for the presentation layer: what can be dropped in,
//! what the result will be called, and how sizes are shown.

use pressjpg_core::{source, ImageUrl, Tier};
use serde::Serialize;
use wasm_bindgen::prelude::*;

const SIZE_UNITS: [&str; 3] = ["Bytes", "KB", "MB"];

/// True when a file would be accepted (MIME type or extension is enough).
#[wasm_bindgen]
pub fn is_supported_image(mime_type: &str, name: &str) -> bool {
    source::is_supported(mime_type, name)
}

/// Download name for a compressed file, e.g. `cat.png` at `small` becomes
/// `cat_small.jpg`.
#[wasm_bindgen]
pub fn output_file_name(name: &str, tier: &str) -> Result<String, JsValue> {
    let tier = tier
        .parse::<Tier>()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(source::output_file_name(name, tier))
}

/// A remote image the page may fetch and submit.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlImport {
    url: String,
    file_name: String,
    mime_type: &'static str,
}

impl From<&ImageUrl> for UrlImport {
    fn from(url: &ImageUrl) -> Self {
        Self {
            url: url.as_str().to_string(),
            file_name: url.file_name(),
            mime_type: url.mime_type(),
        }
    }
}

/// Check an image URL and return `{ url, fileName, mimeType }` for the fetch.
///
/// # Errors
///
/// Returns an error unless the URL is http(s) and ends in a supported image
/// extension.
#[wasm_bindgen]
pub fn validate_image_url(url: &str) -> Result<JsValue, JsValue> {
    let parsed = ImageUrl::parse(url).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&UrlImport::from(&parsed)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
///
/// Values are rounded to two decimals; anything past megabytes stays in MB.
#[wasm_bindgen]
pub fn format_file_size(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", (value * 100.0).round() / 100.0, SIZE_UNITS[unit])
}

/// Percent saved, rounded; negative when the output grew. `undefined` for an
/// empty original.
#[wasm_bindgen]
pub fn savings_percent(original_size: f64, compressed_size: f64) -> Option<i32> {
    pressjpg_core::savings_percent(original_size.max(0.0) as usize, compressed_size.max(0.0) as usize)
        .map(|p| p as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image("image/heic", "IMG_1"));
        assert!(is_supported_image("", "photo.JPEG"));
        assert!(!is_supported_image("image/gif", "photo.gif"));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0.0), "0 Bytes");
        assert_eq!(format_file_size(512.0), "512 Bytes");
        assert_eq!(format_file_size(1536.0), "1.5 KB");
        assert_eq!(format_file_size(1024.0), "1 KB");
        assert_eq!(format_file_size(2_359_296.0), "2.25 MB");
        assert_eq!(format_file_size(5.0 * 1024.0 * 1024.0 * 1024.0), "5120 MB");
        assert_eq!(format_file_size(f64::NAN), "0 Bytes");
    }

    #[test]
    fn test_savings_percent() {
        assert_eq!(savings_percent(2_000_000.0, 500_000.0), Some(75));
        assert_eq!(savings_percent(0.0, 10.0), None);
    }

    #[test]
    fn test_url_import_fields() {
        let url = ImageUrl::parse("https://example.com/pics/cat.WEBP").unwrap();
        let import = UrlImport::from(&url);
        assert_eq!(import.file_name, "image.webp");
        assert_eq!(import.mime_type, "image/webp");
        assert_eq!(import.url, "https://example.com/pics/cat.WEBP");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("cat.png", "very_small").unwrap(), "cat_verysmall.jpg");
        assert!(output_file_name("cat.png", "tiny").is_err());
    }

    #[wasm_bindgen_test]
    fn test_validate_image_url() {
        assert!(validate_image_url("https://example.com/a.png").is_ok());
        assert!(validate_image_url("ftp://example.com/a.png").is_err());
        assert!(validate_image_url("https://example.com/a.gif").is_err());
    }
}
