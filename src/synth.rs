//! Synth — ties keyboard, pointer and parameter events to the audio graph.
//!
//! All event handlers take `&mut self` and never fail. Provider errors are
//! logged and swallowed so a misbehaving graph cannot break the UI.

use crate::config::SynthConfig;
use crate::control::gesture::GestureMapper;
use crate::control::layout::{Control, Layout};
use crate::control::widget::{DrawCommand, render_panel};
use crate::dsp::oscillator::Waveform;
use crate::error::{GraphError, SynthError};
use crate::graph::{AudioGraph, RoutingGraph};
use crate::keyboard::KeyMap;
use crate::params::{ParamId, ParamValue, ParameterSet};
use crate::voice::VoiceManager;

/// The synthesizer control core over an audio-graph provider `G`.
#[derive(Debug)]
pub struct Synth<G: AudioGraph> {
    graph: G,
    params: ParameterSet,
    routing: Option<RoutingGraph>,
    voices: VoiceManager,
    gestures: GestureMapper,
    keymap: KeyMap,
    layout: Layout,
    viewport: (f64, f64),
    controls: Vec<Control>,
}

impl<G: AudioGraph> Synth<G> {
    /// A synth with default parameters, key map and panel layout. Nothing
    /// is built on the graph until [`Synth::setup`] or the first key press.
    pub fn new(graph: G) -> Self {
        Synth {
            graph,
            params: ParameterSet::new(),
            routing: None,
            voices: VoiceManager::new(),
            gestures: GestureMapper::default(),
            keymap: KeyMap::default(),
            layout: Layout::synth_panel(),
            viewport: (0.0, 0.0),
            controls: Vec::new(),
        }
    }

    pub fn with_config(graph: G, config: &SynthConfig) -> Result<Self, SynthError> {
        let mut synth = Self::new(graph);
        synth.params = config.parameter_set()?;
        synth.keymap = config.key_map()?;
        synth.gestures = GestureMapper::new(config.sensitivity, config.hit_radius);
        Ok(synth)
    }

    // ── Audio graph lifecycle ───────────────────────────────

    /// Build the shared routing if it does not exist yet. Returns whether
    /// routing is in place afterwards.
    pub fn setup(&mut self) -> bool {
        if self.routing.is_none() {
            let now = self.graph.current_time();
            let built = RoutingGraph::build(&mut self.graph, &self.params, now);
            self.routing = absorb("setup", built);
        }
        self.routing.is_some()
    }

    pub fn is_set_up(&self) -> bool {
        self.routing.is_some()
    }

    /// Release every voice and disconnect the shared nodes. The next key
    /// press builds fresh routing.
    pub fn teardown(&mut self) {
        let Some(routing) = self.routing.take() else {
            return;
        };
        let released = self.voices.stop_all(&mut self.graph, &routing, &self.params);
        absorb("teardown: release voices", released);
        let now = self.graph.current_time();
        absorb("teardown", routing.teardown(&mut self.graph, now));
        self.voices.clear();
    }

    /// Release every sounding voice, keeping the routing.
    pub fn all_notes_off(&mut self) {
        if let Some(routing) = &self.routing {
            let released = self.voices.stop_all(&mut self.graph, routing, &self.params);
            absorb("all notes off", released);
        }
    }

    // ── Keyboard ────────────────────────────────────────────

    /// Handle a key press (`KeyboardEvent.key`). Auto-repeat and unmapped
    /// keys are ignored. Returns whether a voice was started.
    pub fn key_down(&mut self, key: &str, repeat: bool) -> bool {
        if repeat {
            return false;
        }
        let Some((ch, frequency)) = self.keymap.lookup(key) else {
            return false;
        };
        if !self.setup() {
            return false;
        }
        let Some(routing) = &self.routing else {
            return false;
        };
        let started = self
            .voices
            .start(&mut self.graph, routing, &self.params, ch, frequency);
        absorb("key down", started).unwrap_or(false)
    }

    /// Handle a key release. Returns whether a voice was released.
    pub fn key_up(&mut self, key: &str) -> bool {
        let (Some((ch, _)), Some(routing)) = (self.keymap.lookup(key), &self.routing) else {
            return false;
        };
        let stopped = self.voices.stop(&mut self.graph, routing, &self.params, ch);
        absorb("key up", stopped).unwrap_or(false)
    }

    // ── Parameters ──────────────────────────────────────────

    pub fn param(&self, id: ParamId) -> ParamValue {
        self.params.get(id)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Store a parameter (clamped) and push it to the shared nodes.
    /// Returns the stored value.
    pub fn set_param(&mut self, id: ParamId, value: impl Into<ParamValue>) -> ParamValue {
        let stored = self.params.set(id, value);
        self.push_param(id);
        stored
    }

    /// [`Synth::set_param`] by string key, for the JS and config seams.
    pub fn set_param_by_name(&mut self, name: &str, value: f64) -> Result<ParamValue, SynthError> {
        let id: ParamId = name.parse()?;
        Ok(self.set_param(id, value))
    }

    pub fn set_waveform(&mut self, id: ParamId, waveform: Waveform) -> ParamValue {
        self.set_param(id, waveform)
    }

    pub fn set_switch(&mut self, id: ParamId, on: bool) -> ParamValue {
        self.set_param(id, on)
    }

    fn push_param(&mut self, id: ParamId) {
        if let Some(routing) = &mut self.routing {
            let now = self.graph.current_time();
            let applied = routing.apply(&mut self.graph, &self.params, id, now);
            absorb("parameter update", applied);
        }
    }

    // ── Pointer ─────────────────────────────────────────────

    /// Re-layout the controls for a new viewport size.
    pub fn resize(&mut self, width: f64, height: f64) {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
            self.controls = self.layout.controls(width, height);
        }
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<ParamId> {
        self.gestures.pointer_down(&self.controls, x, y)
    }

    /// Update hover and apply any drag. Returns the new value of the
    /// dragged parameter.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<ParamValue> {
        let delta = self.gestures.pointer_move(&self.controls, x, y)?;
        let stored = self.params.nudge(delta.param, delta.scaled());
        self.push_param(delta.param);
        Some(stored)
    }

    pub fn pointer_up(&mut self) {
        self.gestures.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.gestures.pointer_leave();
    }

    pub fn hovered(&self) -> Option<ParamId> {
        self.gestures.hovered()
    }

    pub fn active_control(&self) -> Option<ParamId> {
        self.gestures.active()
    }

    // ── Rendering ───────────────────────────────────────────

    /// Draw the panel for a `width` × `height` viewport.
    pub fn render(&mut self, width: f64, height: f64) -> Vec<DrawCommand> {
        self.resize(width, height);
        render_panel(&self.controls, &self.params, self.hovered(), width, height)
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn routing(&self) -> Option<&RoutingGraph> {
        self.routing.as_ref()
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }
}

/// Log and drop a provider error.
fn absorb<T>(context: &str, result: Result<T, GraphError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{context}: {e}");
            None
        }
    }
}
