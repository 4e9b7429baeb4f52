//! Parameter store — every synth setting, its range, and its current value.
//!
//! Writes never fail: numeric values are clamped into the parameter's
//! range, and values of the wrong kind are coerced. Readers re-read on
//! every event; nothing is pushed to them.

use std::fmt;
use std::str::FromStr;

use crate::dsp::oscillator::Waveform;
use crate::error::SynthError;

// ── Parameter identifiers ───────────────────────────────────

/// Identifies one synth parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    Osc1Waveform,
    Osc2Waveform,
    Osc1Octave,
    Osc2Octave,
    OscMix,
    Detune,
    Volume,
    Cutoff,
    Resonance,
    FilterEnvAmount,
    LfoRate,
    LfoAmount,
    LfoEnabled,
    Attack,
    Decay,
    Sustain,
    Release,
    FilterAttack,
    FilterDecay,
    FilterSustain,
    FilterRelease,
    ReverbEnabled,
    ReverbMix,
    ReverbSize,
    ReverbDamping,
}

impl ParamId {
    pub const ALL: [ParamId; 25] = [
        ParamId::Osc1Waveform,
        ParamId::Osc2Waveform,
        ParamId::Osc1Octave,
        ParamId::Osc2Octave,
        ParamId::OscMix,
        ParamId::Detune,
        ParamId::Volume,
        ParamId::Cutoff,
        ParamId::Resonance,
        ParamId::FilterEnvAmount,
        ParamId::LfoRate,
        ParamId::LfoAmount,
        ParamId::LfoEnabled,
        ParamId::Attack,
        ParamId::Decay,
        ParamId::Sustain,
        ParamId::Release,
        ParamId::FilterAttack,
        ParamId::FilterDecay,
        ParamId::FilterSustain,
        ParamId::FilterRelease,
        ParamId::ReverbEnabled,
        ParamId::ReverbMix,
        ParamId::ReverbSize,
        ParamId::ReverbDamping,
    ];

    /// Static description of this parameter.
    pub fn spec(self) -> &'static ParamSpec {
        &PARAM_SPECS[self as usize]
    }

    /// Stable string key used by the UI layer and configuration files.
    pub fn key(self) -> &'static str {
        self.spec().key
    }
}

impl FromStr for ParamId {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PARAM_SPECS
            .iter()
            .find(|spec| spec.key == s)
            .map(|spec| spec.id)
            .ok_or_else(|| SynthError::UnknownParameter(s.to_string()))
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ── Parameter descriptions ──────────────────────────────────

/// The kind of value a parameter holds, with its valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// A closed numeric interval.
    Continuous { min: f64, max: f64 },
    /// On/off.
    Switch,
    /// One of the oscillator waveforms.
    Wave,
}

/// Static description of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    /// Stable key (e.g. `"cutoff"`, `"filterEnvAmount"`).
    pub key: &'static str,
    /// Short label drawn under the control.
    pub label: &'static str,
    /// Longer help text shown while the control is hovered.
    pub tooltip: &'static str,
    pub kind: ParamKind,
    pub default: ParamValue,
    /// How many units one unit of drag delta moves this parameter.
    /// `None` for parameters that are not dragged.
    pub drag_scale: Option<f64>,
}

impl ParamSpec {
    /// Coerce `value` into this parameter's kind and range. A NaN number
    /// yields `None`.
    pub fn coerce(&self, value: ParamValue) -> Option<ParamValue> {
        Some(match (self.kind, value) {
            (_, ParamValue::Number(v)) if v.is_nan() => return None,
            (ParamKind::Continuous { min, max }, v) => {
                ParamValue::Number(v.as_f64().clamp(min, max))
            }
            (ParamKind::Switch, ParamValue::Switch(on)) => ParamValue::Switch(on),
            (ParamKind::Switch, v) => ParamValue::Switch(v.as_f64() >= 0.5),
            (ParamKind::Wave, ParamValue::Wave(w)) => ParamValue::Wave(w),
            (ParamKind::Wave, v) => ParamValue::Wave(Waveform::from_index(v.as_f64())),
        })
    }

    /// Position of `value` within the range, in [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        match self.kind {
            ParamKind::Continuous { min, max } => {
                if (max - min).abs() < f64::EPSILON {
                    0.0
                } else {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                }
            }
            ParamKind::Switch => value.clamp(0.0, 1.0),
            ParamKind::Wave => value / (Waveform::ALL.len() - 1) as f64,
        }
    }
}

#[allow(clippy::too_many_arguments)]
const fn continuous(
    id: ParamId,
    key: &'static str,
    label: &'static str,
    tooltip: &'static str,
    min: f64,
    max: f64,
    default: f64,
    drag_scale: f64,
) -> ParamSpec {
    ParamSpec {
        id,
        key,
        label,
        tooltip,
        kind: ParamKind::Continuous { min, max },
        default: ParamValue::Number(default),
        drag_scale: Some(drag_scale),
    }
}

/// Indexed by `ParamId as usize`.
static PARAM_SPECS: [ParamSpec; 25] = [
    ParamSpec {
        id: ParamId::Osc1Waveform,
        key: "osc1Waveform",
        label: "Osc1 Wave",
        tooltip: "Waveform of Oscillator 1",
        kind: ParamKind::Wave,
        default: ParamValue::Wave(Waveform::Sawtooth),
        drag_scale: None,
    },
    ParamSpec {
        id: ParamId::Osc2Waveform,
        key: "osc2Waveform",
        label: "Osc2 Wave",
        tooltip: "Waveform of Oscillator 2",
        kind: ParamKind::Wave,
        default: ParamValue::Wave(Waveform::Sawtooth),
        drag_scale: None,
    },
    continuous(
        ParamId::Osc1Octave,
        "osc1Octave",
        "Osc1 Oct",
        "Shifts Oscillator 1 pitch up/down by octaves",
        -2.0,
        2.0,
        0.0,
        4.0,
    ),
    continuous(
        ParamId::Osc2Octave,
        "osc2Octave",
        "Osc2 Oct",
        "Shifts Oscillator 2 pitch up/down by octaves",
        -2.0,
        2.0,
        0.0,
        4.0,
    ),
    continuous(
        ParamId::OscMix,
        "oscMix",
        "Osc Mix",
        "Balances volume between Oscillator 1 and 2",
        0.0,
        1.0,
        0.5,
        1.0,
    ),
    continuous(
        ParamId::Detune,
        "detune",
        "Detune",
        "Fine-tunes Oscillator 2 pitch",
        -100.0,
        100.0,
        0.0,
        100.0,
    ),
    continuous(
        ParamId::Volume,
        "volume",
        "Volume",
        "Master output level",
        0.0,
        1.0,
        0.5,
        1.0,
    ),
    continuous(
        ParamId::Cutoff,
        "cutoff",
        "Cutoff",
        "Controls filter cutoff frequency",
        20.0,
        20000.0,
        2000.0,
        20000.0,
    ),
    continuous(
        ParamId::Resonance,
        "resonance",
        "Resonance",
        "Controls filter resonance/emphasis",
        0.0,
        1.0,
        1.0,
        1.0,
    ),
    continuous(
        ParamId::FilterEnvAmount,
        "filterEnvAmount",
        "Env Amt",
        "Amount of filter envelope modulation",
        0.0,
        1.0,
        0.5,
        1.0,
    ),
    continuous(
        ParamId::LfoRate,
        "lfoRate",
        "LFO Rate",
        "Speed of LFO modulation",
        0.1,
        20.0,
        1.0,
        20.0,
    ),
    continuous(
        ParamId::LfoAmount,
        "lfoAmount",
        "LFO Amt",
        "Amount of LFO modulation on filter",
        0.0,
        1.0,
        0.5,
        1.0,
    ),
    ParamSpec {
        id: ParamId::LfoEnabled,
        key: "lfoEnabled",
        label: "LFO",
        tooltip: "Routes the LFO onto the filter cutoff",
        kind: ParamKind::Switch,
        default: ParamValue::Switch(true),
        drag_scale: None,
    },
    continuous(
        ParamId::Attack,
        "attack",
        "A",
        "Time for sound to reach full volume",
        0.0,
        2.0,
        0.1,
        2.0,
    ),
    continuous(
        ParamId::Decay,
        "decay",
        "D",
        "Time for sound to reach sustain level",
        0.0,
        2.0,
        0.2,
        2.0,
    ),
    continuous(
        ParamId::Sustain,
        "sustain",
        "S",
        "Volume level while key is held",
        0.0,
        1.0,
        0.7,
        1.0,
    ),
    continuous(
        ParamId::Release,
        "release",
        "R",
        "Time for sound to fade after key release",
        0.0,
        2.0,
        0.3,
        2.0,
    ),
    continuous(
        ParamId::FilterAttack,
        "filterAttack",
        "F.A",
        "Time for filter to reach peak frequency",
        0.0,
        2.0,
        0.1,
        2.0,
    ),
    continuous(
        ParamId::FilterDecay,
        "filterDecay",
        "F.D",
        "Time for filter to reach sustain frequency",
        0.0,
        2.0,
        0.3,
        2.0,
    ),
    continuous(
        ParamId::FilterSustain,
        "filterSustain",
        "F.S",
        "Filter frequency while key is held",
        0.0,
        1.0,
        0.4,
        1.0,
    ),
    continuous(
        ParamId::FilterRelease,
        "filterRelease",
        "F.R",
        "Time for filter to return to the cutoff after key release",
        0.0,
        2.0,
        0.2,
        2.0,
    ),
    ParamSpec {
        id: ParamId::ReverbEnabled,
        key: "reverbEnabled",
        label: "Reverb",
        tooltip: "Sends the filtered signal through the reverb",
        kind: ParamKind::Switch,
        default: ParamValue::Switch(false),
        drag_scale: None,
    },
    continuous(
        ParamId::ReverbMix,
        "reverbMix",
        "Rev Mix",
        "Balance between dry and wet reverb signal",
        0.0,
        1.0,
        0.3,
        1.0,
    ),
    continuous(
        ParamId::ReverbSize,
        "reverbSize",
        "Rev Size",
        "Size of the reverb space",
        0.0,
        1.0,
        0.7,
        1.0,
    ),
    continuous(
        ParamId::ReverbDamping,
        "reverbDamping",
        "Rev Damp",
        "High frequency damping amount",
        0.0,
        1.0,
        0.5,
        1.0,
    ),
];

// ── Values ──────────────────────────────────────────────────

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Switch(bool),
    Wave(Waveform),
}

impl ParamValue {
    /// Numeric view: switches are 0/1, waveforms their selector index.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Number(v) => v,
            ParamValue::Switch(on) => {
                if on {
                    1.0
                } else {
                    0.0
                }
            }
            ParamValue::Wave(w) => w.index() as f64,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(on: bool) -> Self {
        ParamValue::Switch(on)
    }
}

impl From<Waveform> for ParamValue {
    fn from(w: Waveform) -> Self {
        ParamValue::Wave(w)
    }
}

// ── Store ───────────────────────────────────────────────────

/// Current values of every parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    values: [ParamValue; 25],
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut values = [ParamValue::Number(0.0); 25];
        for spec in &PARAM_SPECS {
            values[spec.id as usize] = spec.default;
        }
        ParameterSet { values }
    }
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ParamId) -> ParamValue {
        self.values[id as usize]
    }

    /// Store `value` after clamping/coercing it into `id`'s range.
    /// Returns the value actually stored.
    pub fn set(&mut self, id: ParamId, value: impl Into<ParamValue>) -> ParamValue {
        let Some(stored) = id.spec().coerce(value.into()) else {
            return self.get(id);
        };
        tracing::trace!("param {id} = {stored:?}");
        self.values[id as usize] = stored;
        stored
    }

    /// Numeric view of a parameter (see [`ParamValue::as_f64`]).
    pub fn number(&self, id: ParamId) -> f64 {
        self.get(id).as_f64()
    }

    pub fn switch(&self, id: ParamId) -> bool {
        match self.get(id) {
            ParamValue::Switch(on) => on,
            other => other.as_f64() >= 0.5,
        }
    }

    pub fn waveform(&self, id: ParamId) -> Waveform {
        match self.get(id) {
            ParamValue::Wave(w) => w,
            other => Waveform::from_index(other.as_f64()),
        }
    }

    /// Current value mapped into [0, 1] for display.
    pub fn normalized(&self, id: ParamId) -> f64 {
        id.spec().normalize(self.number(id))
    }

    /// Add `delta` to a numeric parameter, clamped.
    pub fn nudge(&mut self, id: ParamId, delta: f64) -> ParamValue {
        let current = self.number(id);
        self.set(id, current + delta)
    }

    pub fn reset(&mut self, id: ParamId) {
        self.values[id as usize] = id.spec().default;
    }

    /// Iterate over every parameter with its current value.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, ParamValue)> + '_ {
        ParamId::ALL.iter().map(|&id| (id, self.get(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn specs_are_indexed_by_id() {
        for id in ParamId::ALL {
            assert_eq!(id.spec().id, id, "PARAM_SPECS out of order at {id:?}");
        }
    }

    #[test]
    fn keys_round_trip() {
        for id in ParamId::ALL {
            assert_eq!(id.key().parse::<ParamId>().unwrap(), id);
        }
    }

    #[test]
    fn unknown_key_fails() {
        let err = "wobble".parse::<ParamId>().unwrap_err();
        assert!(matches!(err, SynthError::UnknownParameter(ref k) if k == "wobble"));
    }

    #[test]
    fn defaults_are_in_range() {
        let params = ParameterSet::new();
        for (id, value) in params.iter() {
            if let ParamKind::Continuous { min, max } = id.spec().kind {
                let v = value.as_f64();
                assert!(v >= min && v <= max, "{id} default {v} outside [{min}, {max}]");
            }
        }
        assert_eq!(params.number(ParamId::Cutoff), 2000.0);
        assert_eq!(params.waveform(ParamId::Osc1Waveform), Waveform::Sawtooth);
        assert!(params.switch(ParamId::LfoEnabled));
        assert!(!params.switch(ParamId::ReverbEnabled));
    }

    #[test]
    fn out_of_range_writes_clamp() {
        let mut params = ParameterSet::new();
        params.set(ParamId::Detune, 250.0);
        assert_eq!(params.number(ParamId::Detune), 100.0);
        params.set(ParamId::Cutoff, -5.0);
        assert_eq!(params.number(ParamId::Cutoff), 20.0);
        params.set(ParamId::LfoRate, 0.0);
        assert_eq!(params.number(ParamId::LfoRate), 0.1);
    }

    #[test]
    fn nan_write_is_ignored() {
        let mut params = ParameterSet::new();
        params.set(ParamId::OscMix, f64::NAN);
        assert_eq!(params.number(ParamId::OscMix), 0.5);
    }

    #[test]
    fn mismatched_kinds_are_coerced() {
        let mut params = ParameterSet::new();
        params.set(ParamId::ReverbEnabled, 0.9);
        assert!(params.switch(ParamId::ReverbEnabled));
        params.set(ParamId::Osc2Waveform, 3.0);
        assert_eq!(params.waveform(ParamId::Osc2Waveform), Waveform::Sine);
        params.set(ParamId::Sustain, true);
        assert_eq!(params.number(ParamId::Sustain), 1.0);
    }

    #[test]
    fn nudge_adds_and_clamps() {
        let mut params = ParameterSet::new();
        params.nudge(ParamId::Cutoff, 10000.0);
        assert_eq!(params.number(ParamId::Cutoff), 12000.0);
        params.nudge(ParamId::Cutoff, 10000.0);
        assert_eq!(params.number(ParamId::Cutoff), 20000.0);
    }

    #[test]
    fn reset_restores_default() {
        let mut params = ParameterSet::new();
        params.set(ParamId::Attack, 1.5);
        params.reset(ParamId::Attack);
        assert_eq!(params.number(ParamId::Attack), 0.1);
    }

    #[test]
    fn normalized_positions() {
        let mut params = ParameterSet::new();
        params.set(ParamId::Osc1Octave, 0.0);
        assert_eq!(params.normalized(ParamId::Osc1Octave), 0.5);
        params.set(ParamId::Cutoff, 20000.0);
        assert_eq!(params.normalized(ParamId::Cutoff), 1.0);
        params.set(ParamId::Detune, -100.0);
        assert_eq!(params.normalized(ParamId::Detune), 0.0);
    }

    #[test]
    fn coerce_matches_the_store() {
        let spec = ParamId::Cutoff.spec();
        assert_eq!(spec.coerce(ParamValue::Number(1.0e6)), Some(ParamValue::Number(20000.0)));
        assert_eq!(spec.coerce(ParamValue::Number(f64::NAN)), None);
        assert_eq!(
            ParamId::LfoEnabled.spec().coerce(ParamValue::Number(0.2)),
            Some(ParamValue::Switch(false))
        );

        let mut params = ParameterSet::new();
        let stored = params.set(ParamId::Osc1Waveform, 1.2);
        assert_eq!(Some(stored), ParamId::Osc1Waveform.spec().coerce(ParamValue::Number(1.2)));
    }

    fn continuous_ids() -> impl Strategy<Value = ParamId> {
        proptest::sample::select(
            ParamId::ALL
                .iter()
                .copied()
                .filter(|id| matches!(id.spec().kind, ParamKind::Continuous { .. }))
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #[test]
        fn set_then_get_is_clamped(id in continuous_ids(), v in -1.0e9f64..1.0e9) {
            let mut params = ParameterSet::new();
            params.set(id, v);
            let ParamKind::Continuous { min, max } = id.spec().kind else {
                unreachable!()
            };
            prop_assert_eq!(params.number(id), v.clamp(min, max));
        }

        #[test]
        fn infinities_clamp_to_bounds(id in continuous_ids(), positive in any::<bool>()) {
            let mut params = ParameterSet::new();
            let v = if positive { f64::INFINITY } else { f64::NEG_INFINITY };
            params.set(id, v);
            let ParamKind::Continuous { min, max } = id.spec().kind else {
                unreachable!()
            };
            prop_assert_eq!(params.number(id), if positive { max } else { min });
        }
    }
}
