use thiserror::Error;

use crate::cs::graph::VertexId;

/// Errors raised while building a graph or running min cut trials over it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {vertex} lists neighbor {neighbor}, which is never declared")]
    UnknownVertex { vertex: VertexId, neighbor: VertexId },

    #[error("vertex {0} is declared more than once")]
    DuplicateVertex(VertexId),

    #[error("vertex {0} lists itself as a neighbor")]
    SelfLoop(VertexId),

    #[error("graph is disconnected: no edges left to contract with {partitions} partitions remaining")]
    DisconnectedGraph { partitions: usize },

    #[error("a cut needs at least 2 vertices, graph has {0}")]
    TooFewVertices(usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl GraphError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        GraphError::InvalidInput(msg.into())
    }
}

pub type Error = GraphError;
pub type Result<T> = std::result::Result<T, GraphError>;
