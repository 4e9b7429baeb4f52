//! Command graph — an [`AudioGraph`] that records instead of rendering.
//!
//! Every provider call is validated against a model of the node set and
//! appended to a command queue. A host drains the queue and replays it on
//! a real audio context (the WASM bindings hand it to a WebAudio applier).
//! The model also keeps one [`AutomationTimeline`] per touched parameter,
//! so scheduled envelopes can be evaluated at any instant.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::dsp::automation::AutomationTimeline;
use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::dsp::reverb::ReverbImpulse;
use crate::error::GraphError;

use super::{AudioGraph, AudioParam, NodeId, ParamRef};

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GraphCommand {
    CreateOscillator { node: NodeId, waveform: Waveform },
    CreateGain { node: NodeId },
    CreateFilter { node: NodeId, filter_type: FilterType },
    CreateConvolver { node: NodeId },
    Connect { from: NodeId, to: NodeId },
    ConnectParam { from: NodeId, to: NodeId, param: AudioParam },
    Disconnect { node: NodeId },
    SetValueAtTime { node: NodeId, param: AudioParam, value: f64, time: f64 },
    LinearRampToValueAtTime { node: NodeId, param: AudioParam, value: f64, end_time: f64 },
    CancelAndHoldAtTime { node: NodeId, param: AudioParam, time: f64 },
    Start { node: NodeId, time: f64 },
    Stop { node: NodeId, time: f64 },
    SetBuffer { node: NodeId, sample_rate: f64, channels: Vec<Vec<f32>> },
    /// The node is silent and released: disconnect it and drop the handle.
    Discard { node: NodeId },
}

/// Node types known to the command graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Destination,
    Oscillator(Waveform),
    Gain,
    Filter(FilterType),
    Convolver,
}

impl NodeKind {
    /// Intrinsic value of `param` on this node type, or `None` if the node
    /// has no such parameter. Defaults follow the WebAudio node defaults.
    fn param_default(&self, param: AudioParam) -> Option<f64> {
        match (self, param) {
            (NodeKind::Oscillator(_), AudioParam::Frequency) => Some(440.0),
            (NodeKind::Oscillator(_), AudioParam::Detune) => Some(0.0),
            (NodeKind::Gain, AudioParam::Gain) => Some(1.0),
            (NodeKind::Filter(_), AudioParam::Frequency) => Some(350.0),
            (NodeKind::Filter(_), AudioParam::Q) => Some(1.0),
            (NodeKind::Filter(_), AudioParam::Detune) => Some(0.0),
            (NodeKind::Filter(_), AudioParam::Gain) => Some(0.0),
            _ => None,
        }
    }

    fn is_source(&self) -> bool {
        matches!(self, NodeKind::Oscillator(_))
    }
}

/// Where a connection lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Node(NodeId),
    Param(ParamRef),
}

#[derive(Debug, Clone)]
struct NodeState {
    kind: NodeKind,
    outputs: Vec<Endpoint>,
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    buffer_len: Option<usize>,
    released: bool,
}

impl NodeState {
    fn new(kind: NodeKind) -> Self {
        NodeState {
            kind,
            outputs: Vec::new(),
            started_at: None,
            stopped_at: None,
            buffer_len: None,
            released: false,
        }
    }

    /// Whether a released node can be dropped at `now`. `fed` says if any
    /// remaining node still outputs into it.
    fn is_spent(&self, fed: bool, now: f64) -> bool {
        if !self.released || self.kind == NodeKind::Destination {
            return false;
        }
        if self.kind.is_source() {
            match (self.started_at, self.stopped_at) {
                (None, _) => true,
                (Some(_), Some(stop)) => stop <= now,
                (Some(_), None) => false,
            }
        } else {
            !fed
        }
    }
}

/// Recording audio-graph provider with a settable clock.
#[derive(Debug, Clone)]
pub struct CommandGraph {
    sample_rate: f64,
    time: f64,
    next_id: u32,
    nodes: BTreeMap<NodeId, NodeState>,
    timelines: HashMap<ParamRef, AutomationTimeline>,
    commands: Vec<GraphCommand>,
}

impl CommandGraph {
    pub const DESTINATION: NodeId = NodeId(0);

    pub fn new(sample_rate: f64) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(Self::DESTINATION, NodeState::new(NodeKind::Destination));
        CommandGraph {
            sample_rate,
            time: 0.0,
            next_id: 1,
            nodes,
            timelines: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Move the clock to `time` (the host's `AudioContext.currentTime`).
    /// The clock never runs backwards. Released nodes that have gone
    /// silent are discarded and past automation is folded.
    pub fn set_time(&mut self, time: f64) {
        if time.is_finite() && time > self.time {
            self.time = time;
            self.collect();
        }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.set_time(self.time + seconds);
    }

    /// Commands recorded since the last drain.
    pub fn commands(&self) -> &[GraphCommand] {
        &self.commands
    }

    /// Take the pending commands, leaving the queue empty.
    pub fn drain_commands(&mut self) -> Vec<GraphCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(&node).map(|n| n.kind)
    }

    pub fn outputs(&self, node: NodeId) -> &[Endpoint] {
        self.nodes
            .get(&node)
            .map(|n| n.outputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.outputs(from).contains(&Endpoint::Node(to))
    }

    pub fn is_connected_to_param(&self, from: NodeId, to: ParamRef) -> bool {
        self.outputs(from).contains(&Endpoint::Param(to))
    }

    pub fn started_at(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).and_then(|n| n.started_at)
    }

    pub fn stopped_at(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).and_then(|n| n.stopped_at)
    }

    /// Length of the impulse currently loaded in a convolver.
    pub fn buffer_len(&self, node: NodeId) -> Option<usize> {
        self.nodes.get(&node).and_then(|n| n.buffer_len)
    }

    pub fn timeline(&self, param: ParamRef) -> Option<&AutomationTimeline> {
        self.timelines.get(&param)
    }

    /// Scheduled value of `param` at `time`.
    ///
    /// Untouched parameters report their intrinsic default; a parameter
    /// that does not exist reports NaN.
    pub fn param_value_at(&self, param: ParamRef, time: f64) -> f64 {
        match self.timelines.get(&param) {
            Some(timeline) => timeline.value_at(time),
            None => self
                .nodes
                .get(&param.node)
                .and_then(|n| n.kind.param_default(param.param))
                .unwrap_or(f64::NAN),
        }
    }

    fn collect(&mut self) {
        let now = self.time;
        loop {
            let fed: HashSet<NodeId> = self
                .nodes
                .values()
                .flat_map(|n| n.outputs.iter())
                .map(|e| match *e {
                    Endpoint::Node(id) => id,
                    Endpoint::Param(p) => p.node,
                })
                .collect();
            let spent: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(id, n)| n.is_spent(fed.contains(*id), now))
                .map(|(id, _)| *id)
                .collect();
            if spent.is_empty() {
                break;
            }
            for id in spent {
                self.discard(id);
            }
        }
        for timeline in self.timelines.values_mut() {
            timeline.forget_before(now);
        }
    }

    fn discard(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.timelines.retain(|param, _| param.node != id);
        for node in self.nodes.values_mut() {
            node.outputs.retain(|e| match *e {
                Endpoint::Node(to) => to != id,
                Endpoint::Param(p) => p.node != id,
            });
        }
        tracing::trace!("command_graph: discard {id}");
        self.commands.push(GraphCommand::Discard { node: id });
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, NodeState::new(kind));
        tracing::trace!("command_graph: create {kind:?} {id}");
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeState, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeState, GraphError> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    fn timeline_mut(&mut self, param: ParamRef) -> Result<&mut AutomationTimeline, GraphError> {
        let default = self
            .node(param.node)?
            .kind
            .param_default(param.param)
            .ok_or(GraphError::NoSuchParam {
                node: param.node,
                param: param.param.as_str(),
            })?;
        Ok(self
            .timelines
            .entry(param)
            .or_insert_with(|| AutomationTimeline::new(default)))
    }

    fn source_mut(&mut self, id: NodeId) -> Result<&mut NodeState, GraphError> {
        let node = self.node_mut(id)?;
        if node.kind.is_source() {
            Ok(node)
        } else {
            Err(GraphError::NotASource(id))
        }
    }
}

impl AudioGraph for CommandGraph {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn destination(&self) -> NodeId {
        Self::DESTINATION
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> NodeId {
        let node = self.add_node(NodeKind::Oscillator(waveform));
        self.commands.push(GraphCommand::CreateOscillator { node, waveform });
        node
    }

    fn create_gain(&mut self) -> NodeId {
        let node = self.add_node(NodeKind::Gain);
        self.commands.push(GraphCommand::CreateGain { node });
        node
    }

    fn create_filter(&mut self, filter_type: FilterType) -> NodeId {
        let node = self.add_node(NodeKind::Filter(filter_type));
        self.commands.push(GraphCommand::CreateFilter { node, filter_type });
        node
    }

    fn create_convolver(&mut self) -> NodeId {
        let node = self.add_node(NodeKind::Convolver);
        self.commands.push(GraphCommand::CreateConvolver { node });
        node
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfConnection(from));
        }
        self.node(to)?;
        let source = self.node_mut(from)?;
        let endpoint = Endpoint::Node(to);
        if !source.outputs.contains(&endpoint) {
            source.outputs.push(endpoint);
        }
        self.commands.push(GraphCommand::Connect { from, to });
        Ok(())
    }

    fn connect_param(&mut self, from: NodeId, to: ParamRef) -> Result<(), GraphError> {
        if from == to.node {
            return Err(GraphError::SelfConnection(from));
        }
        self.timeline_mut(to)?;
        let source = self.node_mut(from)?;
        let endpoint = Endpoint::Param(to);
        if !source.outputs.contains(&endpoint) {
            source.outputs.push(endpoint);
        }
        self.commands.push(GraphCommand::ConnectParam {
            from,
            to: to.node,
            param: to.param,
        });
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node_mut(node)?.outputs.clear();
        self.commands.push(GraphCommand::Disconnect { node });
        Ok(())
    }

    fn set_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        time: f64,
    ) -> Result<(), GraphError> {
        self.timeline_mut(param)?.set_value_at_time(value, time);
        self.commands.push(GraphCommand::SetValueAtTime {
            node: param.node,
            param: param.param,
            value,
            time,
        });
        Ok(())
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        param: ParamRef,
        value: f64,
        end_time: f64,
    ) -> Result<(), GraphError> {
        self.timeline_mut(param)?
            .linear_ramp_to_value_at_time(value, end_time);
        self.commands.push(GraphCommand::LinearRampToValueAtTime {
            node: param.node,
            param: param.param,
            value,
            end_time,
        });
        Ok(())
    }

    fn cancel_and_hold_at_time(&mut self, param: ParamRef, time: f64) -> Result<(), GraphError> {
        self.timeline_mut(param)?.cancel_and_hold_at_time(time);
        self.commands.push(GraphCommand::CancelAndHoldAtTime {
            node: param.node,
            param: param.param,
            time,
        });
        Ok(())
    }

    fn start(&mut self, node: NodeId, time: f64) -> Result<(), GraphError> {
        let source = self.source_mut(node)?;
        if source.started_at.is_some() {
            return Err(GraphError::AlreadyStarted(node));
        }
        source.started_at = Some(time);
        self.commands.push(GraphCommand::Start { node, time });
        Ok(())
    }

    fn stop(&mut self, node: NodeId, time: f64) -> Result<(), GraphError> {
        self.source_mut(node)?.stopped_at = Some(time);
        self.commands.push(GraphCommand::Stop { node, time });
        Ok(())
    }

    fn release(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.node_mut(node)?.released = true;
        Ok(())
    }

    fn set_buffer(&mut self, node: NodeId, impulse: &ReverbImpulse) -> Result<(), GraphError> {
        let state = self.node_mut(node)?;
        if state.kind != NodeKind::Convolver {
            return Err(GraphError::NotAConvolver(node));
        }
        state.buffer_len = Some(impulse.len());
        self.commands.push(GraphCommand::SetBuffer {
            node,
            sample_rate: impulse.sample_rate,
            channels: impulse.channels.clone(),
        });
        Ok(())
    }
}
