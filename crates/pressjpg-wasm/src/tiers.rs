//! Tier table and settings bindings.
//!
//! Both are plain data, so they cross the boundary as JS objects through
//! `serde-wasm-bindgen` rather than as wrapper classes.

use pressjpg_core::{CompressorConfig, Tier};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// One row of the tier table, as seen from JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TierInfo {
    tier: Tier,
    label: &'static str,
    display_name: &'static str,
    initial_quality: f32,
    size_ceiling: u32,
    max_iterations: usize,
}

impl From<Tier> for TierInfo {
    fn from(tier: Tier) -> Self {
        let preset = tier.preset();
        Self {
            tier,
            label: tier.label(),
            display_name: tier.display_name(),
            initial_quality: preset.initial_quality.as_fraction(),
            size_ceiling: preset.size_ceiling,
            max_iterations: tier.max_iterations(),
        }
    }
}

pub(crate) fn tier_table() -> Vec<TierInfo> {
    Tier::ALL.into_iter().map(TierInfo::from).collect()
}

/// All tiers, largest first, as
/// `{ tier, label, displayName, initialQuality, sizeCeiling, maxIterations }`.
#[wasm_bindgen]
pub fn tier_presets() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&tier_table()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Read settings from a JS object; `undefined` and `null` give the defaults.
pub(crate) fn config_from_js(value: JsValue) -> Result<CompressorConfig, JsValue> {
    let config = if value.is_undefined() || value.is_null() {
        CompressorConfig::default()
    } else {
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

/// Validate a settings object and return it with every default filled in.
#[wasm_bindgen]
pub fn parse_config(value: JsValue) -> Result<JsValue, JsValue> {
    let config = config_from_js(value)?;
    serde_wasm_bindgen::to_value(&config).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        let table = tier_table();
        assert_eq!(table.len(), 4);

        assert_eq!(table[0].tier, Tier::Large);
        assert_eq!(table[0].size_ceiling, 1_048_576);
        assert_eq!(table[0].initial_quality, 0.9);

        let very_small = &table[3];
        assert_eq!(very_small.label, "verysmall");
        assert_eq!(very_small.size_ceiling, 128_000);
        assert_eq!(very_small.max_iterations, 7);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_tier_presets_is_array() {
        let value = tier_presets().unwrap();
        assert!(js_sys::Array::is_array(&value));
        assert_eq!(js_sys::Array::from(&value).length(), 4);
    }

    #[wasm_bindgen_test]
    fn test_config_defaults() {
        let config = config_from_js(JsValue::UNDEFINED).unwrap();
        assert_eq!(config, CompressorConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_config_rejects_bad_quality() {
        let value = js_sys::JSON::parse(r#"{"heicConversionQuality": 0}"#).unwrap();
        assert!(parse_config(value).is_err());
    }

    #[wasm_bindgen_test]
    fn test_config_reads_tier() {
        let value = js_sys::JSON::parse(r#"{"tier": "small"}"#).unwrap();
        let config = config_from_js(value).unwrap();
        assert_eq!(config.tier, Tier::Small);
    }
}
