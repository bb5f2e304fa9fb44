use serde::Deserialize;
use starbook::{Config, CoverInputs, get_compatibility};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverRenderOptions {
    width: Option<f32>,
    font_family: Option<String>,
    animate: Option<bool>,
}

fn build_config(options: CoverRenderOptions) -> Config {
    let mut config = Config::default();
    if let Some(width) = options.width {
        config.cover.width = width;
    }
    if let Some(font_family) = options.font_family {
        config.cover.font_family = font_family;
    }
    if let Some(animate) = options.animate {
        config.cover.animate = animate;
    }
    config
}

fn render_inputs(inputs_json: &str, options: CoverRenderOptions) -> Result<String, String> {
    let inputs: CoverInputs = serde_json::from_str(inputs_json).map_err(|error| error.to_string())?;
    let config = build_config(options);
    config.validate().map_err(|error| error.to_string())?;
    config
        .compositor()
        .compose(&inputs)
        .map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn render_cover_svg(inputs_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<CoverRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        CoverRenderOptions::default()
    };
    render_inputs(inputs_json, options).map_err(|error| JsValue::from_str(&error))
}

/// JSON for the ordered pair, or `null` when either sign is unknown.
#[wasm_bindgen]
pub fn compatibility_json(sign_a: &str, sign_b: &str) -> Result<String, JsValue> {
    serde_json::to_string(&get_compatibility(sign_a, sign_b))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
