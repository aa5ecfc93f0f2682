pub mod karger;
pub mod multigraph;

pub use karger::{
    karger_min_cut, random_min_cut, recommended_trials, Cut, MinCutEstimator, MinCutTrial,
};
pub use multigraph::{
    AdjacencyRecord, Edge, EdgeIndex, Graph, GraphBuilder, MultiEdgePolicy, Vertex, VertexId,
};
