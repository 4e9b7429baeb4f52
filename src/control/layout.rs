//! Control layout — where each knob and slider sits, and hit testing.
//!
//! Positions are offsets from the viewport center, so the panel stays
//! centered as the window resizes.

use serde::Serialize;

use crate::params::ParamId;

/// How a control is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Knob,
    Slider,
}

/// A control placed relative to the viewport center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub param: ParamId,
    pub kind: ControlKind,
    pub dx: f64,
    pub dy: f64,
}

/// A control at absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub param: ParamId,
    pub kind: ControlKind,
    pub x: f64,
    pub y: f64,
}

impl Control {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

const fn knob(param: ParamId, dx: f64, dy: f64) -> Placement {
    Placement {
        param,
        kind: ControlKind::Knob,
        dx,
        dy,
    }
}

const ROW_OSC_FILTER: f64 = -100.0;
const ROW_ENVELOPES: f64 = 50.0;
const ROW_OUTPUT: f64 = 200.0;

const SYNTH_PANEL: [Placement; 21] = [
    knob(ParamId::Osc1Octave, -400.0, ROW_OSC_FILTER),
    knob(ParamId::OscMix, -300.0, ROW_OSC_FILTER),
    knob(ParamId::Detune, -200.0, ROW_OSC_FILTER),
    knob(ParamId::Osc2Octave, -100.0, ROW_OSC_FILTER),
    knob(ParamId::Cutoff, 0.0, ROW_OSC_FILTER),
    knob(ParamId::Resonance, 100.0, ROW_OSC_FILTER),
    knob(ParamId::FilterEnvAmount, 200.0, ROW_OSC_FILTER),
    knob(ParamId::LfoRate, 300.0, ROW_OSC_FILTER),
    knob(ParamId::LfoAmount, 400.0, ROW_OSC_FILTER),
    knob(ParamId::Attack, -300.0, ROW_ENVELOPES),
    knob(ParamId::Decay, -200.0, ROW_ENVELOPES),
    knob(ParamId::Sustain, -100.0, ROW_ENVELOPES),
    knob(ParamId::Release, 0.0, ROW_ENVELOPES),
    knob(ParamId::FilterAttack, 100.0, ROW_ENVELOPES),
    knob(ParamId::FilterDecay, 200.0, ROW_ENVELOPES),
    knob(ParamId::FilterSustain, 300.0, ROW_ENVELOPES),
    knob(ParamId::ReverbMix, 400.0, ROW_ENVELOPES),
    knob(ParamId::ReverbSize, 500.0, ROW_ENVELOPES),
    knob(ParamId::ReverbDamping, 600.0, ROW_ENVELOPES),
    Placement {
        param: ParamId::Volume,
        kind: ControlKind::Slider,
        dx: -400.0,
        dy: ROW_OUTPUT,
    },
    knob(ParamId::FilterRelease, 100.0, ROW_OUTPUT),
];

/// An ordered set of placements.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    placements: Vec<Placement>,
}

impl Default for Layout {
    fn default() -> Self {
        Self::synth_panel()
    }
}

impl Layout {
    /// The synth's single panel: oscillator/filter/LFO row, envelope and
    /// reverb row, then volume and filter release.
    pub fn synth_panel() -> Self {
        Layout {
            placements: SYNTH_PANEL.to_vec(),
        }
    }

    pub fn new(placements: Vec<Placement>) -> Self {
        Layout { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Absolute control positions for a `width` × `height` viewport.
    pub fn controls(&self, width: f64, height: f64) -> Vec<Control> {
        let (cx, cy) = (width / 2.0, height / 2.0);
        self.placements
            .iter()
            .map(|p| Control {
                param: p.param,
                kind: p.kind,
                x: cx + p.dx,
                y: cy + p.dy,
            })
            .collect()
    }
}

/// The control nearest to `(x, y)` whose center is strictly closer than `radius`.
pub fn hit_test(controls: &[Control], x: f64, y: f64, radius: f64) -> Option<&Control> {
    controls
        .iter()
        .map(|c| (c, c.distance_to(x, y)))
        .filter(|&(_, d)| d < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}
