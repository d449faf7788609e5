//! HEIC conversion through a JavaScript callback.
//!
//! Browsers have no native HEIC decoder available to WASM, so the page may
//! pass a synchronous function `(bytes: Uint8Array, quality: number) =>
//! Uint8Array` that returns JPEG bytes. Without one, HEIC input fails with a
//! conversion error and the page is expected to convert before calling in.

use js_sys::{Function, Uint8Array};
use pressjpg_core::decode::ConversionError;
use pressjpg_core::{HeicConverter, Quality};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub(crate) struct JsHeicConverter {
    callback: Option<Function>,
}

impl JsHeicConverter {
    pub(crate) fn new(callback: Option<Function>) -> Self {
        Self { callback }
    }
}

impl HeicConverter for JsHeicConverter {
    fn convert_to_jpeg(&self, bytes: &[u8], quality: Quality) -> Result<Vec<u8>, ConversionError> {
        let Some(callback) = &self.callback else {
            return Err(ConversionError::Unavailable);
        };

        let input = Uint8Array::from(bytes);
        let quality = JsValue::from_f64(f64::from(quality.as_fraction()));
        let output = callback
            .call2(&JsValue::NULL, &input, &quality)
            .map_err(|e| ConversionError::Converter(describe(&e)))?;

        match output.dyn_into::<Uint8Array>() {
            Ok(jpeg) => Ok(jpeg.to_vec()),
            Err(_) => Err(ConversionError::Converter(
                "converter did not return a Uint8Array".to_string(),
            )),
        }
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_callback_is_unavailable() {
        let converter = JsHeicConverter::new(None);
        let result = converter.convert_to_jpeg(b"ftypheic", Quality::from_percent(90));
        assert_eq!(result, Err(ConversionError::Unavailable));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_callback_output_is_used() {
        let callback = Function::new_with_args("bytes, q", "return new Uint8Array([0xFF, 0xD8, q * 100]);");
        let converter = JsHeicConverter::new(Some(callback));
        let jpeg = converter
            .convert_to_jpeg(b"heic", Quality::from_percent(90))
            .unwrap();
        assert_eq!(jpeg, vec![0xFF, 0xD8, 90]);
    }

    #[wasm_bindgen_test]
    fn test_callback_throwing_is_converter_error() {
        let callback = Function::new_with_args("bytes, q", "throw 'no decoder';");
        let converter = JsHeicConverter::new(Some(callback));
        let result = converter.convert_to_jpeg(b"heic", Quality::from_percent(90));
        assert_eq!(result, Err(ConversionError::Converter("no decoder".to_string())));
    }

    #[wasm_bindgen_test]
    fn test_callback_wrong_return_type() {
        let callback = Function::new_with_args("bytes, q", "return 42;");
        let converter = JsHeicConverter::new(Some(callback));
        assert!(converter
            .convert_to_jpeg(b"heic", Quality::from_percent(90))
            .is_err());
    }
}
