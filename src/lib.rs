//! Karger's randomized minimum cut over an undirected multigraph that is contracted
//! in place and reset between trials.

pub mod cs;
pub mod error;

pub use cs::graph;
pub use error::{Error, GraphError, Result};
