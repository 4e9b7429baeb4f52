//! Startup configuration, read from JSON.
//!
//! ```json
//! {
//!   "sensitivity": 0.005,
//!   "hitRadius": 30,
//!   "keymap": { "a": 220.0, "s": 246.94 },
//!   "params": { "cutoff": 1200, "lfoEnabled": 0 },
//!   "waveforms": { "osc2Waveform": "square" }
//! }
//! ```
//!
//! Every field is optional. Parameter values are clamped like any other
//! write; unknown parameter or waveform names are errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::control::gesture::{DEFAULT_HIT_RADIUS, DEFAULT_SENSITIVITY};
use crate::dsp::oscillator::Waveform;
use crate::error::SynthError;
use crate::keyboard::KeyMap;
use crate::params::{ParamId, ParamKind, ParameterSet};

fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}

fn default_hit_radius() -> f64 {
    DEFAULT_HIT_RADIUS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SynthConfig {
    /// Value change per pixel of drag.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Pointer hit radius in pixels.
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f64,
    /// Replaces the default key map when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keymap: Option<BTreeMap<String, f64>>,
    /// Initial numeric parameter values by key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
    /// Initial waveforms by parameter key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub waveforms: BTreeMap<String, String>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sensitivity: DEFAULT_SENSITIVITY,
            hit_radius: DEFAULT_HIT_RADIUS,
            keymap: None,
            params: BTreeMap::new(),
            waveforms: BTreeMap::new(),
        }
    }
}

impl SynthConfig {
    pub fn from_json(json: &str) -> Result<Self, SynthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SynthError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The key map this configuration selects.
    pub fn key_map(&self) -> Result<KeyMap, SynthError> {
        match &self.keymap {
            Some(entries) => KeyMap::from_entries(entries.iter().map(|(k, &f)| (k.as_str(), f))),
            None => Ok(KeyMap::default()),
        }
    }

    /// Default parameters with this configuration's overrides applied.
    pub fn parameter_set(&self) -> Result<ParameterSet, SynthError> {
        let mut params = ParameterSet::new();
        for (key, &value) in &self.params {
            params.set(key.parse::<ParamId>()?, value);
        }
        for (key, name) in &self.waveforms {
            let id: ParamId = key.parse()?;
            if id.spec().kind != ParamKind::Wave {
                return Err(SynthError::NotAWaveform(key.clone()));
            }
            params.set(id, name.parse::<Waveform>()?);
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = SynthConfig::from_json("{}").unwrap();
        assert_eq!(config, SynthConfig::default());
        assert_eq!(config.parameter_set().unwrap(), ParameterSet::new());
        assert_eq!(config.key_map().unwrap(), KeyMap::default());
    }

    #[test]
    fn overrides_are_clamped() {
        let config = SynthConfig::from_json(
            r#"{ "params": { "cutoff": 50000, "lfoEnabled": 0 }, "waveforms": { "osc2Waveform": "square" } }"#,
        )
        .unwrap();
        let params = config.parameter_set().unwrap();
        assert_eq!(params.number(ParamId::Cutoff), 20000.0);
        assert!(!params.switch(ParamId::LfoEnabled));
        assert_eq!(params.waveform(ParamId::Osc2Waveform), Waveform::Square);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = SynthConfig::from_json(r#"{ "sensitivty": 0.01 }"#).unwrap_err();
        assert!(matches!(err, SynthError::Config(_)), "got {err:?}");
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let config = SynthConfig::from_json(r#"{ "params": { "wobble": 1 } }"#).unwrap();
        assert!(matches!(
            config.parameter_set(),
            Err(SynthError::UnknownParameter(ref k)) if k == "wobble"
        ));
    }

    #[test]
    fn waveform_must_target_a_waveform_param() {
        let config = SynthConfig::from_json(r#"{ "waveforms": { "cutoff": "sine" } }"#).unwrap();
        assert!(matches!(config.parameter_set(), Err(SynthError::NotAWaveform(_))));
        let config = SynthConfig::from_json(r#"{ "waveforms": { "osc1Waveform": "noise" } }"#).unwrap();
        assert!(matches!(config.parameter_set(), Err(SynthError::UnknownWaveform(_))));
    }

    #[test]
    fn custom_keymap() {
        let config = SynthConfig::from_json(r#"{ "keymap": { "a": 220 }, "hitRadius": 40 }"#).unwrap();
        let map = config.key_map().unwrap();
        assert_eq!(map.frequency('a'), Some(220.0));
        assert_eq!(map.frequency('z'), None);
        assert_eq!(config.hit_radius, 40.0);
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = SynthConfig::default();
        config.params.insert("volume".into(), 0.8);
        let back = SynthConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
