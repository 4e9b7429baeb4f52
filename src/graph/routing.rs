//! Signal routing — the shared part of the synth's audio graph.
//!
//! ```text
//! voice gains ─► filter ─┬─► dry ──────────────┬─► master ─► destination
//!                        └─► convolver ─► wet ─┘
//! lfo ─► lfo gain ─► filter.frequency
//! ```
//!
//! Built once per session and torn down explicitly. Voices connect their
//! gain into [`RoutingGraph::input`].

use crate::dsp::filter::{FilterType, resonance_to_q};
use crate::dsp::mixer::dry_wet_gains;
use crate::dsp::oscillator::Waveform;
use crate::dsp::reverb::ReverbImpulse;
use crate::error::GraphError;
use crate::params::{ParamId, ParameterSet};

use super::{AudioGraph, AudioParam, NodeId, ParamRef};

/// LFO depth in Hz at full `lfoAmount`.
pub const LFO_DEPTH_HZ: f64 = 2000.0;

/// Handles to the shared nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingGraph {
    filter: NodeId,
    lfo: NodeId,
    lfo_gain: NodeId,
    lfo_running: bool,
    convolver: NodeId,
    dry: NodeId,
    wet: NodeId,
    master: NodeId,
}

impl RoutingGraph {
    /// Create and wire the shared nodes, initialized from `params`.
    ///
    /// The LFO is only connected and started if it is enabled now; see
    /// [`RoutingGraph::apply_lfo`].
    pub fn build<G: AudioGraph + ?Sized>(
        graph: &mut G,
        params: &ParameterSet,
        now: f64,
    ) -> Result<Self, GraphError> {
        let master = graph.create_gain();
        let filter = graph.create_filter(FilterType::Lowpass);
        let lfo = graph.create_oscillator(Waveform::Sine);
        let lfo_gain = graph.create_gain();
        let convolver = graph.create_convolver();
        let dry = graph.create_gain();
        let wet = graph.create_gain();

        let mut routing = RoutingGraph {
            filter,
            lfo,
            lfo_gain,
            lfo_running: false,
            convolver,
            dry,
            wet,
            master,
        };

        routing.apply_volume(graph, params, now)?;
        routing.apply_filter(graph, params, now)?;
        routing.apply_lfo(graph, params, now)?;
        routing.rebuild_reverb(graph, params)?;

        graph.connect(filter, dry)?;
        graph.connect(filter, convolver)?;
        graph.connect(convolver, wet)?;
        routing.apply_reverb_mix(graph, params, now)?;

        graph.connect(dry, master)?;
        graph.connect(wet, master)?;
        let destination = graph.destination();
        graph.connect(master, destination)?;

        tracing::debug!(
            "routing: built (filter {filter}, master {master}, lfo {})",
            if routing.lfo_running { "running" } else { "idle" }
        );
        Ok(routing)
    }

    /// Where voices connect their output.
    pub fn input(&self) -> NodeId {
        self.filter
    }

    /// The shared lowpass filter.
    pub fn filter(&self) -> NodeId {
        self.filter
    }

    pub fn filter_frequency(&self) -> ParamRef {
        ParamRef::frequency(self.filter)
    }

    pub fn master(&self) -> NodeId {
        self.master
    }

    pub fn convolver(&self) -> NodeId {
        self.convolver
    }

    pub fn lfo(&self) -> NodeId {
        self.lfo
    }

    pub fn lfo_gain(&self) -> NodeId {
        self.lfo_gain
    }

    pub fn dry(&self) -> NodeId {
        self.dry
    }

    pub fn wet(&self) -> NodeId {
        self.wet
    }

    pub fn lfo_running(&self) -> bool {
        self.lfo_running
    }

    /// Push the shared-node side of a parameter change onto the graph.
    /// Parameters that only affect future voices are ignored.
    pub fn apply<G: AudioGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        params: &ParameterSet,
        id: ParamId,
        now: f64,
    ) -> Result<(), GraphError> {
        match id {
            ParamId::Cutoff | ParamId::Resonance => self.apply_filter(graph, params, now),
            ParamId::LfoRate | ParamId::LfoAmount | ParamId::LfoEnabled => {
                self.apply_lfo(graph, params, now)
            }
            ParamId::ReverbEnabled | ParamId::ReverbMix => {
                self.apply_reverb_mix(graph, params, now)
            }
            ParamId::ReverbSize | ParamId::ReverbDamping => self.rebuild_reverb(graph, params),
            ParamId::Volume => self.apply_volume(graph, params, now),
            _ => Ok(()),
        }
    }

    /// Filter frequency = cutoff, Q = resonance × 20.
    pub fn apply_filter<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        params: &ParameterSet,
        now: f64,
    ) -> Result<(), GraphError> {
        graph.set_value_at_time(self.filter_frequency(), params.number(ParamId::Cutoff), now)?;
        graph.set_value_at_time(
            ParamRef::new(self.filter, AudioParam::Q),
            resonance_to_q(params.number(ParamId::Resonance)),
            now,
        )
    }

    /// LFO rate and depth. An enabled LFO that has never run is connected
    /// and started; disabling only silences its gain.
    pub fn apply_lfo<G: AudioGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        params: &ParameterSet,
        now: f64,
    ) -> Result<(), GraphError> {
        let enabled = params.switch(ParamId::LfoEnabled);
        let depth = if enabled {
            params.number(ParamId::LfoAmount) * LFO_DEPTH_HZ
        } else {
            0.0
        };

        graph.set_value_at_time(
            ParamRef::frequency(self.lfo),
            params.number(ParamId::LfoRate),
            now,
        )?;
        graph.set_value_at_time(ParamRef::gain(self.lfo_gain), depth, now)?;

        if enabled && !self.lfo_running {
            graph.connect(self.lfo, self.lfo_gain)?;
            graph.connect_param(self.lfo_gain, self.filter_frequency())?;
            graph.start(self.lfo, now)?;
            self.lfo_running = true;
            tracing::debug!("routing: lfo started at {now:.3}");
        }
        Ok(())
    }

    /// Dry/wet balance from `reverbEnabled` and `reverbMix`.
    pub fn apply_reverb_mix<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        params: &ParameterSet,
        now: f64,
    ) -> Result<(), GraphError> {
        let (dry, wet) = dry_wet_gains(
            params.switch(ParamId::ReverbEnabled),
            params.number(ParamId::ReverbMix),
        );
        graph.set_value_at_time(ParamRef::gain(self.dry), dry, now)?;
        graph.set_value_at_time(ParamRef::gain(self.wet), wet, now)
    }

    /// Replace the convolver's impulse with a fresh one built from
    /// `reverbSize` and `reverbDamping`. An empty impulse keeps the old buffer.
    pub fn rebuild_reverb<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        params: &ParameterSet,
    ) -> Result<(), GraphError> {
        let impulse = ReverbImpulse::build(
            graph.sample_rate(),
            params.number(ParamId::ReverbSize),
            params.number(ParamId::ReverbDamping),
        );
        if impulse.is_empty() {
            tracing::debug!("routing: reverb size 0, keeping previous impulse");
            return Ok(());
        }
        tracing::debug!("routing: new reverb impulse, {} samples", impulse.len());
        graph.set_buffer(self.convolver, &impulse)
    }

    pub fn apply_volume<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        params: &ParameterSet,
        now: f64,
    ) -> Result<(), GraphError> {
        graph.set_value_at_time(ParamRef::gain(self.master), params.number(ParamId::Volume), now)
    }

    /// Disconnect and release every shared node. The LFO is stopped if it
    /// was running.
    pub fn teardown<G: AudioGraph + ?Sized>(
        self,
        graph: &mut G,
        now: f64,
    ) -> Result<(), GraphError> {
        if self.lfo_running {
            graph.stop(self.lfo, now)?;
        }
        for node in [
            self.lfo,
            self.lfo_gain,
            self.filter,
            self.convolver,
            self.dry,
            self.wet,
            self.master,
        ] {
            graph.disconnect(node)?;
            graph.release(node)?;
        }
        tracing::debug!("routing: torn down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CommandGraph;

    fn build(params: &ParameterSet) -> (CommandGraph, RoutingGraph) {
        let mut graph = CommandGraph::new(8000.0);
        let routing = RoutingGraph::build(&mut graph, params, 0.0).unwrap();
        (graph, routing)
    }

    #[test]
    fn wires_the_fixed_topology() {
        let (graph, routing) = build(&ParameterSet::new());

        assert!(graph.is_connected(routing.filter(), routing.dry()));
        assert!(graph.is_connected(routing.filter(), routing.convolver()));
        assert!(graph.is_connected(routing.convolver(), routing.wet()));
        assert!(graph.is_connected(routing.dry(), routing.master()));
        assert!(graph.is_connected(routing.wet(), routing.master()));
        assert!(graph.is_connected(routing.master(), CommandGraph::DESTINATION));
    }

    #[test]
    fn initial_values_follow_params() {
        let (graph, routing) = build(&ParameterSet::new());

        assert_eq!(graph.param_value_at(routing.filter_frequency(), 0.0), 2000.0);
        assert_eq!(graph.param_value_at(ParamRef::new(routing.filter(), AudioParam::Q), 0.0), 20.0);
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.master()), 0.0), 0.5);
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.lfo_gain()), 0.0), 1000.0);
        assert_eq!(graph.param_value_at(ParamRef::frequency(routing.lfo()), 0.0), 1.0);
        // Reverb is off by default: all dry.
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.dry()), 0.0), 1.0);
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.wet()), 0.0), 0.0);
        assert_eq!(graph.buffer_len(routing.convolver()), Some(16800), "8000 × 0.7 × 3");
    }

    #[test]
    fn enabled_lfo_modulates_filter_frequency() {
        let (graph, routing) = build(&ParameterSet::new());
        assert!(routing.lfo_running());
        assert!(graph.is_connected(routing.lfo(), routing.lfo_gain()));
        assert!(graph.is_connected_to_param(routing.lfo_gain(), routing.filter_frequency()));
        assert_eq!(graph.started_at(routing.lfo()), Some(0.0));
    }

    #[test]
    fn disabled_lfo_stays_idle_until_enabled() {
        let mut params = ParameterSet::new();
        params.set(ParamId::LfoEnabled, false);
        let (mut graph, mut routing) = build(&params);

        assert!(!routing.lfo_running());
        assert!(!graph.is_connected(routing.lfo(), routing.lfo_gain()));
        assert_eq!(graph.started_at(routing.lfo()), None);

        graph.set_time(2.0);
        params.set(ParamId::LfoEnabled, true);
        routing.apply(&mut graph, &params, ParamId::LfoEnabled, 2.0).unwrap();

        assert!(routing.lfo_running());
        assert!(graph.is_connected_to_param(routing.lfo_gain(), routing.filter_frequency()));
        assert_eq!(graph.started_at(routing.lfo()), Some(2.0));
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.lfo_gain()), 2.0), 1000.0);
    }

    #[test]
    fn toggling_lfo_starts_it_only_once() {
        let mut params = ParameterSet::new();
        let (mut graph, mut routing) = build(&params);

        params.set(ParamId::LfoEnabled, false);
        routing.apply(&mut graph, &params, ParamId::LfoEnabled, 1.0).unwrap();
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.lfo_gain()), 1.0), 0.0);

        params.set(ParamId::LfoEnabled, true);
        routing
            .apply(&mut graph, &params, ParamId::LfoEnabled, 2.0)
            .expect("re-enabling must not start the LFO twice");
        assert_eq!(graph.started_at(routing.lfo()), Some(0.0));
    }

    #[test]
    fn reverb_mix_follows_switch() {
        let mut params = ParameterSet::new();
        let (mut graph, routing) = build(&params);

        params.set(ParamId::ReverbEnabled, true);
        params.set(ParamId::ReverbMix, 0.25);
        routing.apply_reverb_mix(&mut graph, &params, 1.0).unwrap();

        assert_eq!(graph.param_value_at(ParamRef::gain(routing.dry()), 1.0), 0.75);
        assert_eq!(graph.param_value_at(ParamRef::gain(routing.wet()), 1.0), 0.25);
    }

    #[test]
    fn reverb_size_change_swaps_impulse() {
        let mut params = ParameterSet::new();
        let (mut graph, mut routing) = build(&params);

        params.set(ParamId::ReverbSize, 0.5);
        routing.apply(&mut graph, &params, ParamId::ReverbSize, 0.0).unwrap();
        assert_eq!(graph.buffer_len(routing.convolver()), Some(12000));
    }

    #[test]
    fn zero_size_keeps_previous_impulse() {
        let mut params = ParameterSet::new();
        let (mut graph, mut routing) = build(&params);

        params.set(ParamId::ReverbSize, 0.0);
        routing.apply(&mut graph, &params, ParamId::ReverbSize, 0.0).unwrap();
        assert_eq!(graph.buffer_len(routing.convolver()), Some(16800));
    }

    #[test]
    fn voice_only_params_do_not_touch_the_graph() {
        let params = ParameterSet::new();
        let (mut graph, mut routing) = build(&params);
        let before = graph.commands().len();
        routing.apply(&mut graph, &params, ParamId::Attack, 0.0).unwrap();
        routing.apply(&mut graph, &params, ParamId::Osc1Waveform, 0.0).unwrap();
        assert_eq!(graph.commands().len(), before);
    }

    #[test]
    fn teardown_disconnects_everything() {
        let (mut graph, routing) = build(&ParameterSet::new());
        let (filter, master, lfo) = (routing.filter(), routing.master(), routing.lfo());
        routing.teardown(&mut graph, 3.0).unwrap();

        assert!(graph.outputs(filter).is_empty());
        assert!(graph.outputs(master).is_empty());
        assert_eq!(graph.stopped_at(lfo), Some(3.0));

        graph.set_time(3.0);
        assert_eq!(graph.node_count(), 1, "only the destination is left");
    }
}
