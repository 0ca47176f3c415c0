pub mod compiler;
pub mod dsp;
pub mod error;

use crate::dsp::engine::{AudioEngine, parse_score};
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the abora_synth version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: resolve the shared context of a JSON score against the
/// built-in defaults, for editors that display effective settings.
#[wasm_bindgen]
pub fn resolve_score_context(json: &str) -> Result<JsValue, JsValue> {
    let score = parse_score(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let context = compiler::resolve_context(score.context.as_ref(), None);
    serde_wasm_bindgen::to_value(&context).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render a JSON score to mono f32 samples.
#[wasm_bindgen]
pub fn render_score_samples(json: &str, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let samples = AudioEngine::new(sample_rate)
        .render_json(json)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(samples.iter().map(|&s| s as f32).collect())
}

/// WASM-exposed: render a JSON score to a 32-bit mono WAV byte array.
/// Clipped output is still returned; the clipping is logged.
#[wasm_bindgen]
pub fn render_score_wav(json: &str, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let score = parse_score(json).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let (bytes, _summary) = AudioEngine::new(sample_rate)
        .render_wav_bytes(&score)
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(bytes)
}
