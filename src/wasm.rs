//! JS handle around a [`Synth`] driving a [`CommandGraph`].
//!
//! The page forwards its DOM events here, passing `AudioContext.currentTime`
//! with anything that schedules audio, then drains the recorded graph
//! commands and replays them on its real `AudioContext`.

use wasm_bindgen::prelude::*;

use crate::config::SynthConfig;
use crate::dsp::oscillator::Waveform;
use crate::graph::CommandGraph;
use crate::params::ParamId;
use crate::synth::Synth;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

#[wasm_bindgen]
pub struct WebSynth {
    synth: Synth<CommandGraph>,
}

impl WebSynth {
    /// Move the graph clock to the host's `currentTime` before an event.
    fn at(&mut self, now: f64) -> &mut Synth<CommandGraph> {
        self.synth.graph_mut().set_time(now);
        &mut self.synth
    }
}

#[wasm_bindgen]
impl WebSynth {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> WebSynth {
        WebSynth {
            synth: Synth::new(CommandGraph::new(sample_rate)),
        }
    }

    /// Create a synth from a JSON configuration string.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(sample_rate: f64, config: &str) -> Result<WebSynth, JsValue> {
        let config = SynthConfig::from_json(config).map_err(js_error)?;
        let synth = Synth::with_config(CommandGraph::new(sample_rate), &config).map_err(js_error)?;
        Ok(WebSynth { synth })
    }

    /// Build the shared audio routing now instead of on the first key.
    pub fn setup(&mut self, now: f64) -> bool {
        self.at(now).setup()
    }

    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&mut self, key: &str, repeat: bool, now: f64) -> bool {
        self.at(now).key_down(key, repeat)
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&mut self, key: &str, now: f64) -> bool {
        self.at(now).key_up(key)
    }

    /// Set a parameter by key; returns the stored (clamped) value. Throws
    /// on an unknown key.
    #[wasm_bindgen(js_name = setParam)]
    pub fn set_param(&mut self, name: &str, value: f64, now: f64) -> Result<f64, JsValue> {
        let stored = self.at(now).set_param_by_name(name, value).map_err(js_error)?;
        Ok(stored.as_f64())
    }

    #[wasm_bindgen(js_name = getParam)]
    pub fn get_param(&self, name: &str) -> Result<f64, JsValue> {
        let id: ParamId = name.parse().map_err(js_error)?;
        Ok(self.synth.param(id).as_f64())
    }

    /// Select a waveform (`"sawtooth"`, `"square"`, `"triangle"`, `"sine"`).
    #[wasm_bindgen(js_name = setWaveform)]
    pub fn set_waveform(&mut self, name: &str, waveform: &str, now: f64) -> Result<(), JsValue> {
        let id: ParamId = name.parse().map_err(js_error)?;
        let waveform: Waveform = waveform.parse().map_err(js_error)?;
        self.at(now).set_waveform(id, waveform);
        Ok(())
    }

    /// Returns the key of the grabbed control, if any.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<String> {
        self.synth.pointer_down(x, y).map(|id| id.key().to_string())
    }

    /// Returns the dragged parameter's new value, if a control is held.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) -> Option<f64> {
        self.at(now).pointer_move(x, y).map(|v| v.as_f64())
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) {
        self.synth.pointer_up();
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.synth.pointer_leave();
    }

    pub fn hovered(&self) -> Option<String> {
        self.synth.hovered().map(|id| id.key().to_string())
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.synth.resize(width, height);
    }

    /// Draw commands for one frame.
    pub fn render(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        let frame = self.synth.render(width, height);
        serde_wasm_bindgen::to_value(&frame).map_err(js_error)
    }

    /// Graph commands recorded since the last drain, oldest first.
    #[wasm_bindgen(js_name = drainCommands)]
    pub fn drain_commands(&mut self) -> Result<JsValue, JsValue> {
        let commands = self.synth.graph_mut().drain_commands();
        serde_wasm_bindgen::to_value(&commands).map_err(js_error)
    }

    #[wasm_bindgen(js_name = allNotesOff)]
    pub fn all_notes_off(&mut self, now: f64) {
        self.at(now).all_notes_off();
    }

    pub fn teardown(&mut self, now: f64) {
        self.at(now).teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphCommand;

    #[test]
    fn events_advance_the_clock() {
        let mut web = WebSynth::new(8000.0);
        assert!(web.key_down("z", false, 0.5));
        assert!(web.key_up("z", 1.0));
        let last_stop = web
            .synth
            .graph()
            .commands()
            .iter()
            .rev()
            .find_map(|c| match c {
                GraphCommand::Stop { time, .. } => Some(*time),
                _ => None,
            })
            .unwrap();
        assert!((last_stop - 1.3).abs() < 1e-9, "stop scheduled from the key-up time");
    }

    #[test]
    fn set_param_returns_clamped_value() {
        let mut web = WebSynth::new(8000.0);
        assert_eq!(web.set_param("resonance", 3.0, 0.0).unwrap(), 1.0);
        assert_eq!(web.get_param("resonance").unwrap(), 1.0);
    }

    #[test]
    fn pointer_reports_param_keys() {
        let mut web = WebSynth::new(8000.0);
        web.resize(1000.0, 1000.0);
        assert_eq!(web.pointer_down(500.0, 400.0).as_deref(), Some("cutoff"));
        assert_eq!(web.pointer_move(500.0, 390.0, 0.0), Some(3000.0));
        assert_eq!(web.hovered().as_deref(), Some("cutoff"));
    }
}
