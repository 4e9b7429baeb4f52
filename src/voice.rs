//! Voice — one sounding note: an oscillator pair mixed into a per-voice gain.
//!
//! Voices are tracked per key. The map is the only record of what is
//! sounding; once a voice is released its entry is gone, and its nodes
//! ring out under the audio graph's ownership.

use std::collections::HashMap;

use crate::dsp::envelope::EnvelopeGenerator;
use crate::dsp::filter::envelope_peak;
use crate::dsp::mixer::oscillator_gains;
use crate::dsp::oscillator::octave_frequency;
use crate::error::GraphError;
use crate::graph::{AudioGraph, AudioParam, NodeId, ParamRef, RoutingGraph};
use crate::params::{ParamId, ParameterSet};

/// Node handles and metadata for one sounding note.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub key: char,
    /// Note frequency before octave shifts.
    pub frequency: f64,
    pub osc1: NodeId,
    pub osc2: NodeId,
    pub osc1_gain: NodeId,
    pub osc2_gain: NodeId,
    /// Per-voice amplitude envelope target.
    pub gain: NodeId,
    pub started_at: f64,
}

impl Voice {
    /// Build the voice's nodes, wire them into `routing` and schedule both
    /// envelopes from `now`.
    fn start<G: AudioGraph + ?Sized>(
        graph: &mut G,
        routing: &RoutingGraph,
        params: &ParameterSet,
        key: char,
        frequency: f64,
        now: f64,
    ) -> Result<Self, GraphError> {
        let osc1 = graph.create_oscillator(params.waveform(ParamId::Osc1Waveform));
        let osc2 = graph.create_oscillator(params.waveform(ParamId::Osc2Waveform));
        let gain = graph.create_gain();
        let osc1_gain = graph.create_gain();
        let osc2_gain = graph.create_gain();

        graph.set_value_at_time(
            ParamRef::frequency(osc1),
            octave_frequency(frequency, params.number(ParamId::Osc1Octave)),
            now,
        )?;
        graph.set_value_at_time(
            ParamRef::frequency(osc2),
            octave_frequency(frequency, params.number(ParamId::Osc2Octave)),
            now,
        )?;
        graph.set_value_at_time(
            ParamRef::new(osc2, AudioParam::Detune),
            params.number(ParamId::Detune),
            now,
        )?;

        let (mix1, mix2) = oscillator_gains(params.number(ParamId::OscMix));
        graph.set_value_at_time(ParamRef::gain(osc1_gain), mix1, now)?;
        graph.set_value_at_time(ParamRef::gain(osc2_gain), mix2, now)?;

        graph.connect(osc1, osc1_gain)?;
        graph.connect(osc2, osc2_gain)?;
        graph.connect(osc1_gain, gain)?;
        graph.connect(osc2_gain, gain)?;
        graph.connect(gain, routing.input())?;

        EnvelopeGenerator::schedule_amplitude(
            graph,
            ParamRef::gain(gain),
            params.number(ParamId::Attack),
            params.number(ParamId::Decay),
            params.number(ParamId::Sustain),
            now,
        )?;

        let cutoff = params.number(ParamId::Cutoff);
        EnvelopeGenerator::schedule_filter_envelope(
            graph,
            routing.filter_frequency(),
            cutoff,
            envelope_peak(cutoff, params.number(ParamId::FilterEnvAmount)),
            params.number(ParamId::FilterAttack),
            params.number(ParamId::FilterDecay),
            params.number(ParamId::FilterSustain),
            now,
        )?;

        graph.start(osc1, now)?;
        graph.start(osc2, now)?;

        Ok(Voice {
            key,
            frequency,
            osc1,
            osc2,
            osc1_gain,
            osc2_gain,
            gain,
            started_at: now,
        })
    }

    /// Schedule both release ramps from `now`, stop the oscillators once
    /// the longer one has finished, and hand the nodes back to the graph.
    fn release<G: AudioGraph + ?Sized>(
        &self,
        graph: &mut G,
        routing: &RoutingGraph,
        params: &ParameterSet,
        now: f64,
    ) -> Result<(), GraphError> {
        let release = params.number(ParamId::Release);
        let filter_release = params.number(ParamId::FilterRelease);

        EnvelopeGenerator::schedule_release(graph, ParamRef::gain(self.gain), release, now)?;
        EnvelopeGenerator::schedule_filter_release(
            graph,
            routing.filter_frequency(),
            params.number(ParamId::Cutoff),
            filter_release,
            now,
        )?;

        let end = now + release.max(filter_release);
        graph.stop(self.osc1, end)?;
        graph.stop(self.osc2, end)?;
        for node in [self.osc1, self.osc2, self.osc1_gain, self.osc2_gain, self.gain] {
            graph.release(node)?;
        }
        Ok(())
    }
}

/// Tracks at most one voice per key.
#[derive(Debug, Clone, Default)]
pub struct VoiceManager {
    voices: HashMap<char, Voice>,
}

impl VoiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a voice for `key` at `frequency`.
    ///
    /// Returns `Ok(false)` without touching the graph if `key` is already
    /// sounding.
    pub fn start<G: AudioGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        routing: &RoutingGraph,
        params: &ParameterSet,
        key: char,
        frequency: f64,
    ) -> Result<bool, GraphError> {
        if self.voices.contains_key(&key) {
            return Ok(false);
        }
        let now = graph.current_time();
        let voice = Voice::start(graph, routing, params, key, frequency, now)?;
        tracing::debug!("voice: start '{key}' {frequency:.2} Hz at {now:.3}");
        self.voices.insert(key, voice);
        Ok(true)
    }

    /// Release the voice for `key`. Its entry is removed before the release
    /// is scheduled, so the key is free again even if scheduling fails.
    ///
    /// Returns `Ok(false)` if `key` was not sounding.
    pub fn stop<G: AudioGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        routing: &RoutingGraph,
        params: &ParameterSet,
        key: char,
    ) -> Result<bool, GraphError> {
        let Some(voice) = self.voices.remove(&key) else {
            return Ok(false);
        };
        let now = graph.current_time();
        tracing::debug!("voice: stop '{key}' at {now:.3}");
        voice.release(graph, routing, params, now)?;
        Ok(true)
    }

    /// Release every sounding voice. All voices are released even if some
    /// fail; the first error is returned.
    pub fn stop_all<G: AudioGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        routing: &RoutingGraph,
        params: &ParameterSet,
    ) -> Result<(), GraphError> {
        let now = graph.current_time();
        let mut first_error = None;
        for (_, voice) in self.voices.drain() {
            if let Err(e) = voice.release(graph, routing, params, now) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Forget every voice without scheduling anything. Used when the
    /// routing they were connected to is gone.
    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn get(&self, key: char) -> Option<&Voice> {
        self.voices.get(&key)
    }

    pub fn contains(&self, key: char) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Sounding keys, sorted.
    pub fn active_keys(&self) -> Vec<char> {
        let mut keys: Vec<char> = self.voices.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CommandGraph;

    struct Rig {
        graph: CommandGraph,
        routing: RoutingGraph,
        params: ParameterSet,
        voices: VoiceManager,
    }

    impl Rig {
        fn new() -> Self {
            let mut graph = CommandGraph::new(8000.0);
            let params = ParameterSet::new();
            let routing = RoutingGraph::build(&mut graph, &params, 0.0).unwrap();
            Rig {
                graph,
                routing,
                params,
                voices: VoiceManager::new(),
            }
        }

        fn start(&mut self, key: char, freq: f64) -> bool {
            self.voices
                .start(&mut self.graph, &self.routing, &self.params, key, freq)
                .unwrap()
        }

        fn stop(&mut self, key: char) -> bool {
            self.voices
                .stop(&mut self.graph, &self.routing, &self.params, key)
                .unwrap()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn double_start_keeps_one_voice() {
        let mut rig = Rig::new();
        assert!(rig.start('z', 261.63));
        let nodes = rig.graph.node_count();
        assert!(!rig.start('z', 261.63), "second start should be a no-op");
        assert_eq!(rig.voices.len(), 1);
        assert_eq!(rig.graph.node_count(), nodes, "no nodes created for a duplicate start");
    }

    #[test]
    fn stop_on_idle_key_is_noop() {
        let mut rig = Rig::new();
        let before = rig.graph.commands().len();
        assert!(!rig.stop('q'));
        assert_eq!(rig.graph.commands().len(), before);
    }

    #[test]
    fn voice_wiring() {
        let mut rig = Rig::new();
        rig.start('n', 440.0);
        let v = rig.voices.get('n').unwrap().clone();

        assert!(rig.graph.is_connected(v.osc1, v.osc1_gain));
        assert!(rig.graph.is_connected(v.osc2, v.osc2_gain));
        assert!(rig.graph.is_connected(v.osc1_gain, v.gain));
        assert!(rig.graph.is_connected(v.osc2_gain, v.gain));
        assert!(rig.graph.is_connected(v.gain, rig.routing.input()));
        assert_eq!(rig.graph.started_at(v.osc1), Some(0.0));
        assert_eq!(rig.graph.started_at(v.osc2), Some(0.0));
    }

    #[test]
    fn octave_shifts_scale_frequency() {
        let mut rig = Rig::new();
        rig.params.set(ParamId::Osc1Octave, 1.0);
        rig.params.set(ParamId::Osc2Octave, -1.0);
        rig.params.set(ParamId::Detune, 12.0);
        rig.start('n', 440.0);
        let v = rig.voices.get('n').unwrap().clone();

        assert!(approx(rig.graph.param_value_at(ParamRef::frequency(v.osc1), 0.0), 880.0));
        assert!(approx(rig.graph.param_value_at(ParamRef::frequency(v.osc2), 0.0), 220.0));
        assert_eq!(
            rig.graph.param_value_at(ParamRef::new(v.osc2, AudioParam::Detune), 0.0),
            12.0
        );
    }

    #[test]
    fn mix_gains_sum_to_one() {
        let mut rig = Rig::new();
        rig.params.set(ParamId::OscMix, 0.8);
        rig.start('x', 293.66);
        let v = rig.voices.get('x').unwrap().clone();

        let g1 = rig.graph.param_value_at(ParamRef::gain(v.osc1_gain), 0.0);
        let g2 = rig.graph.param_value_at(ParamRef::gain(v.osc2_gain), 0.0);
        assert!(approx(g1, 0.8));
        assert!(approx(g2, 0.2));
    }

    #[test]
    fn amplitude_and_filter_envelopes_scheduled() {
        let mut rig = Rig::new();
        rig.graph.set_time(1.0);
        rig.start('z', 261.63);
        let v = rig.voices.get('z').unwrap().clone();
        let gain = ParamRef::gain(v.gain);
        let cutoff = rig.routing.filter_frequency();

        assert!(approx(rig.graph.param_value_at(gain, 1.0), 0.0));
        assert!(approx(rig.graph.param_value_at(gain, 1.1), 1.0));
        assert!(approx(rig.graph.param_value_at(gain, 1.3), 0.7));

        // cutoff 2000, env amount 0.5 → peak 7000, sustain 0.4 → 4000
        assert!(approx(rig.graph.param_value_at(cutoff, 1.0), 2000.0));
        assert!(approx(rig.graph.param_value_at(cutoff, 1.1), 7000.0));
        assert!(approx(rig.graph.param_value_at(cutoff, 1.4), 4000.0));
    }

    #[test]
    fn press_release_stops_after_longest_release() {
        let mut rig = Rig::new();
        rig.params.set(ParamId::Release, 0.3);
        rig.params.set(ParamId::FilterRelease, 0.9);
        rig.start('z', 261.63);
        let v = rig.voices.get('z').unwrap().clone();

        rig.graph.set_time(2.0);
        assert!(rig.stop('z'));
        assert!(!rig.voices.contains('z'), "entry removed as soon as stop returns");

        let stop = rig.graph.stopped_at(v.osc1).unwrap();
        assert!(stop >= 2.0 + 0.9 - 1e-9, "osc1 stopped at {stop}");
        assert_eq!(rig.graph.stopped_at(v.osc2), Some(stop));
        assert!(approx(rig.graph.param_value_at(ParamRef::gain(v.gain), 2.3), 0.0));
        assert!(approx(
            rig.graph.param_value_at(rig.routing.filter_frequency(), 2.9),
            2000.0
        ));
    }

    #[test]
    fn repress_after_release_overlaps() {
        let mut rig = Rig::new();
        rig.start('c', 329.63);
        let first = rig.voices.get('c').unwrap().osc1;
        rig.stop('c');
        assert!(rig.start('c', 329.63), "key is free again right after stop");
        assert_ne!(rig.voices.get('c').unwrap().osc1, first);
    }

    #[test]
    fn finished_voices_leave_nothing_behind() {
        let mut rig = Rig::new();
        let base = rig.graph.node_count();
        let filter = rig.routing.filter_frequency();
        let mut now = 0.0;
        for _ in 0..500 {
            now += 0.25;
            rig.graph.set_time(now);
            rig.start('z', 261.63);
            now += 0.25;
            rig.graph.set_time(now);
            rig.stop('z');
            rig.graph.drain_commands();
            assert!(rig.graph.node_count() <= base + 15, "{} nodes", rig.graph.node_count());
            assert!(rig.graph.timeline(filter).unwrap().events().len() <= 12);
        }

        rig.graph.set_time(now + 100.0);
        assert!(rig.voices.is_empty());
        assert_eq!(rig.graph.node_count(), base);
        assert_eq!(rig.graph.timeline(filter).unwrap().events().len(), 1);
        assert!(approx(rig.graph.param_value_at(filter, now + 100.0), 2000.0));
    }

    #[test]
    fn stop_all_releases_everything() {
        let mut rig = Rig::new();
        rig.start('z', 261.63);
        rig.start('m', 493.88);
        assert_eq!(rig.voices.active_keys(), vec!['m', 'z']);

        rig.voices
            .stop_all(&mut rig.graph, &rig.routing, &rig.params)
            .unwrap();
        assert!(rig.voices.is_empty());
    }
}
