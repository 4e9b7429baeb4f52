//! Envelope generator — linear ADSR ramps scheduled on the audio graph.
//!
//! An envelope here is not a per-sample state machine. Each stage becomes
//! an automation event issued against the graph clock, after which the
//! generator forgets about it. Releasing early is done by issuing a new
//! ramp that overrides the trajectory from the current value.

use crate::error::GraphError;
use crate::graph::{AudioGraph, ParamRef};

use super::filter::FILTER_CEILING_HZ;

/// One point of an envelope schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopePoint {
    /// Jump to `value` at `offset` seconds after the start instant.
    Set { value: f64, offset: f64 },
    /// Ramp linearly to `value`, arriving `offset` seconds after the start instant.
    Ramp { value: f64, offset: f64 },
}

impl EnvelopePoint {
    pub fn offset(&self) -> f64 {
        match *self {
            EnvelopePoint::Set { offset, .. } | EnvelopePoint::Ramp { offset, .. } => offset,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            EnvelopePoint::Set { value, .. } | EnvelopePoint::Ramp { value, .. } => value,
        }
    }

    fn set_value(&mut self, new_value: f64) {
        match self {
            EnvelopePoint::Set { value, .. } | EnvelopePoint::Ramp { value, .. } => {
                *value = new_value
            }
        }
    }
}

/// An ordered list of envelope points relative to a start instant.
///
/// Offsets are non-negative and strictly increasing. A stage of zero
/// length does not add a point; it overwrites the value of the point it
/// coincides with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeSchedule {
    points: Vec<EnvelopePoint>,
}

impl EnvelopeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to `value` at `offset`.
    pub fn set(self, value: f64, offset: f64) -> Self {
        self.push(EnvelopePoint::Set {
            value,
            offset: sanitize(offset),
        })
    }

    /// Ramp to `value`, arriving at `offset`.
    pub fn ramp(self, value: f64, offset: f64) -> Self {
        self.push(EnvelopePoint::Ramp {
            value,
            offset: sanitize(offset),
        })
    }

    pub fn points(&self) -> &[EnvelopePoint] {
        &self.points
    }

    /// Offset of the final point (total scheduled duration).
    pub fn duration(&self) -> f64 {
        self.points.last().map_or(0.0, EnvelopePoint::offset)
    }

    /// Issue every point against `target`, relative to `start`.
    pub fn apply<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        target: ParamRef,
        start: f64,
    ) -> Result<(), GraphError> {
        for point in &self.points {
            match *point {
                EnvelopePoint::Set { value, offset } => {
                    graph.set_value_at_time(target, value, start + offset)?
                }
                EnvelopePoint::Ramp { value, offset } => {
                    graph.linear_ramp_to_value_at_time(target, value, start + offset)?
                }
            }
        }
        Ok(())
    }

    fn push(mut self, point: EnvelopePoint) -> Self {
        if let Some(last) = self.points.last_mut() {
            if point.offset() <= last.offset() {
                last.set_value(point.value());
                return self;
            }
        }
        self.points.push(point);
        self
    }
}

/// Negative or non-finite offsets are treated as zero.
fn sanitize(offset: f64) -> f64 {
    if offset.is_finite() { offset.max(0.0) } else { 0.0 }
}

/// Amplitude attack/decay/sustain: 0 → 1 over `attack`, 1 → `sustain` over `decay`.
pub fn amplitude_schedule(attack: f64, decay: f64, sustain: f64) -> EnvelopeSchedule {
    let attack = sanitize(attack);
    let decay = sanitize(decay);
    EnvelopeSchedule::new()
        .set(0.0, 0.0)
        .ramp(1.0, attack)
        .ramp(sustain, attack + decay)
}

/// Filter attack/decay/sustain between `base` and `peak` (peak clamped to
/// the 20 kHz ceiling). `sustain_fraction` places the sustain frequency
/// between base and peak.
pub fn filter_schedule(
    base: f64,
    peak: f64,
    attack: f64,
    decay: f64,
    sustain_fraction: f64,
) -> EnvelopeSchedule {
    let attack = sanitize(attack);
    let decay = sanitize(decay);
    let peak = peak.min(FILTER_CEILING_HZ);
    let sustain = base + (peak - base) * sustain_fraction;
    EnvelopeSchedule::new()
        .set(base, 0.0)
        .ramp(peak, attack)
        .ramp(sustain, attack + decay)
}

/// Issues envelope ramps. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeGenerator;

impl EnvelopeGenerator {
    /// Ramp `target` 0 → 1 over `attack`, then to `sustain` over `decay`,
    /// measured from `start`.
    pub fn schedule_amplitude<G: AudioGraph + ?Sized>(
        graph: &mut G,
        target: ParamRef,
        attack: f64,
        decay: f64,
        sustain: f64,
        start: f64,
    ) -> Result<(), GraphError> {
        amplitude_schedule(attack, decay, sustain).apply(graph, target, start)
    }

    /// Ramp `target` from its current value to 0 over `release`.
    pub fn schedule_release<G: AudioGraph + ?Sized>(
        graph: &mut G,
        target: ParamRef,
        release: f64,
        from: f64,
    ) -> Result<(), GraphError> {
        Self::ramp_from_current(graph, target, 0.0, release, from)
    }

    /// Frequency envelope on `target`: base → peak over `attack`, then to the
    /// sustain frequency over `decay`.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule_filter_envelope<G: AudioGraph + ?Sized>(
        graph: &mut G,
        target: ParamRef,
        base: f64,
        peak: f64,
        attack: f64,
        decay: f64,
        sustain_fraction: f64,
        start: f64,
    ) -> Result<(), GraphError> {
        filter_schedule(base, peak, attack, decay, sustain_fraction).apply(graph, target, start)
    }

    /// Ramp a frequency `target` from its current value back to `base` over `release`.
    pub fn schedule_filter_release<G: AudioGraph + ?Sized>(
        graph: &mut G,
        target: ParamRef,
        base: f64,
        release: f64,
        from: f64,
    ) -> Result<(), GraphError> {
        Self::ramp_from_current(graph, target, base, release, from)
    }

    fn ramp_from_current<G: AudioGraph + ?Sized>(
        graph: &mut G,
        target: ParamRef,
        value: f64,
        duration: f64,
        from: f64,
    ) -> Result<(), GraphError> {
        graph.cancel_and_hold_at_time(target, from)?;
        graph.linear_ramp_to_value_at_time(target, value, from + sanitize(duration))
    }
}
