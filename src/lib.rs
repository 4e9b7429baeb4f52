pub mod config;
pub mod control;
pub mod dsp;
pub mod error;
pub mod graph;
pub mod keyboard;
pub mod notes;
pub mod params;
pub mod synth;
pub mod voice;
pub mod wasm;

use wasm_bindgen::prelude::*;

pub use config::SynthConfig;
pub use error::{GraphError, SynthError};
pub use graph::{AudioGraph, CommandGraph, GraphCommand, RoutingGraph};
pub use params::{ParamId, ParamValue, ParameterSet};
pub use synth::Synth;
pub use wasm::WebSynth;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the knobsynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: note frequency for a `KeyboardEvent.key` in the default
/// key map, or `undefined`.
#[wasm_bindgen]
pub fn key_frequency(key: &str) -> Option<f64> {
    keyboard::KeyMap::default().lookup(key).map(|(_, f)| f)
}

/// WASM-exposed: build a reverb impulse (`{ sampleRate, channels }`).
/// `size` and `damping` are clamped like the `reverbSize` and
/// `reverbDamping` parameters.
#[wasm_bindgen]
pub fn reverb_impulse(sample_rate: f64, size: f64, damping: f64) -> Result<JsValue, JsValue> {
    let impulse = impulse_for(sample_rate, size, damping)?;
    serde_wasm_bindgen::to_value(&impulse).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn impulse_for(
    sample_rate: f64,
    size: f64,
    damping: f64,
) -> Result<dsp::reverb::ReverbImpulse, JsValue> {
    if !(sample_rate.is_finite() && sample_rate > 0.0 && sample_rate <= MAX_SAMPLE_RATE) {
        return Err(JsValue::from_str(&format!("Invalid sample rate: {sample_rate}")));
    }
    let mut params = ParameterSet::new();
    let size = params.set(ParamId::ReverbSize, size).as_f64();
    let damping = params.set(ParamId::ReverbDamping, damping).as_f64();
    Ok(dsp::reverb::ReverbImpulse::build(sample_rate, size, damping))
}

/// Highest sample rate accepted from the host (WebAudio allows up to 768 kHz).
const MAX_SAMPLE_RATE: f64 = 768_000.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_reverb_is_clamped() {
        let impulse = impulse_for(1000.0, 1.0e6, 0.5).unwrap();
        assert_eq!(impulse.len(), 3000, "size clamps to 1.0, i.e. three seconds");
    }

    #[test]
    fn default_key_frequencies() {
        assert_eq!(key_frequency("n"), Some(440.0));
        assert_eq!(key_frequency("q"), None);
    }
}
