use thiserror::Error;

use crate::graph::NodeId;

/// Errors surfaced at the string-keyed seams of the crate (JS bindings,
/// configuration files). Control events themselves never fail.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("Unknown waveform '{0}'")]
    UnknownWaveform(String),
    #[error("Parameter '{0}' does not take a waveform")]
    NotAWaveform(String),
    #[error("Invalid key map entry '{key}': {reason}")]
    InvalidKeyMap { key: String, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Audio graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Errors reported by an [`AudioGraph`](crate::graph::AudioGraph) provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),
    #[error("Node {node} has no '{param}' parameter")]
    NoSuchParam { node: NodeId, param: &'static str },
    #[error("Node {0} cannot be started or stopped")]
    NotASource(NodeId),
    #[error("Node {0} was already started")]
    AlreadyStarted(NodeId),
    #[error("Node {0} does not accept a buffer")]
    NotAConvolver(NodeId),
    #[error("Cannot connect node {0} to itself")]
    SelfConnection(NodeId),
}
