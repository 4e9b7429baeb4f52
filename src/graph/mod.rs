//! Audio graph — the seam between the synth core and whatever renders audio.
//!
//! The core never produces samples itself. It creates nodes, wires them
//! and schedules parameter automation against an [`AudioGraph`] provider,
//! the way a page drives a WebAudio `AudioContext`. All calls are
//! fire-and-forget against the provider's clock.

pub mod command;
pub mod routing;

use std::fmt;

use serde::Serialize;

use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::dsp::reverb::ReverbImpulse;
use crate::error::GraphError;

pub use command::{CommandGraph, GraphCommand};
pub use routing::RoutingGraph;

/// Opaque handle to a node owned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Automatable parameters exposed by the node types in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioParam {
    /// `GainNode.gain`
    Gain,
    /// `OscillatorNode.frequency` / `BiquadFilterNode.frequency`
    Frequency,
    /// `OscillatorNode.detune` (cents)
    Detune,
    /// `BiquadFilterNode.Q`
    #[serde(rename = "Q")]
    Q,
}

impl AudioParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioParam::Gain => "gain",
            AudioParam::Frequency => "frequency",
            AudioParam::Detune => "detune",
            AudioParam::Q => "Q",
        }
    }
}

/// A specific parameter on a specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ParamRef {
    pub node: NodeId,
    pub param: AudioParam,
}

impl ParamRef {
    pub fn new(node: NodeId, param: AudioParam) -> Self {
        ParamRef { node, param }
    }

    pub fn gain(node: NodeId) -> Self {
        Self::new(node, AudioParam::Gain)
    }

    pub fn frequency(node: NodeId) -> Self {
        Self::new(node, AudioParam::Frequency)
    }
}

/// An audio-graph provider.
///
/// Mirrors the subset of the WebAudio API the synth needs. Times are in
/// seconds on the provider's own clock ([`AudioGraph::current_time`]).
pub trait AudioGraph {
    fn sample_rate(&self) -> f64;
    fn current_time(&self) -> f64;

    /// The final output node.
    fn destination(&self) -> NodeId;

    fn create_oscillator(&mut self, waveform: Waveform) -> NodeId;
    fn create_gain(&mut self) -> NodeId;
    fn create_filter(&mut self, filter_type: FilterType) -> NodeId;
    fn create_convolver(&mut self) -> NodeId;

    /// Route `from`'s output into `to`'s input.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError>;
    /// Route `from`'s output into an automatable parameter (modulation).
    fn connect_param(&mut self, from: NodeId, to: ParamRef) -> Result<(), GraphError>;
    /// Remove every outgoing connection of `node`.
    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError>;

    fn set_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        time: f64,
    ) -> Result<(), GraphError>;
    fn linear_ramp_to_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        end_time: f64,
    ) -> Result<(), GraphError>;
    /// Drop automation after `time` and hold the value the parameter has then.
    fn cancel_and_hold_at_time(&mut self, param: ParamRef, time: f64) -> Result<(), GraphError>;

    /// Start a source node. Sources start at most once.
    fn start(&mut self, node: NodeId, time: f64) -> Result<(), GraphError>;
    fn stop(&mut self, node: NodeId, time: f64) -> Result<(), GraphError>;

    /// Give up the caller's handle on `node`. The provider may discard it
    /// once it can no longer sound: a source after its stop time, any
    /// other node once nothing live feeds it.
    fn release(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Swap the impulse response of a convolver. Takes effect for
    /// subsequently processed samples.
    fn set_buffer(&mut self, node: NodeId, impulse: &ReverbImpulse) -> Result<(), GraphError>;
}
