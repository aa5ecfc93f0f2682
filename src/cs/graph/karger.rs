use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::cs::graph::multigraph::{Edge, Graph, VertexId};
use crate::error::{GraphError, Result};

/// The two-sided partition a trial ended on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    /// Number of edges crossing between the two sides.
    pub size: usize,
    /// Vertex ids on each side, sorted. The side holding the lower partition id comes first.
    pub sides: [Vec<VertexId>; 2],
    /// The crossing edges, sorted.
    pub crossing_edges: Vec<Edge>,
}

/// Trial count giving a failure probability of at most `1/n`: `ceil(n^2 * ln(n))`, at least 1.
pub fn recommended_trials(num_vertices: usize) -> usize {
    if num_vertices < 2 {
        return 1;
    }
    let n = num_vertices as f64;
    ((n * n * n.ln()).ceil() as usize).max(1)
}

/// One random contraction of a graph down to two partitions.
///
/// The trial borrows the graph exclusively and always leaves it reset, whether it
/// finishes or fails.
pub struct MinCutTrial<'g> {
    graph: &'g mut Graph,
}

impl<'g> MinCutTrial<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self { graph }
    }

    /// Merges uniformly chosen current edges until two partitions remain and reports
    /// the edges left between them.
    ///
    /// # Errors
    /// * `TooFewVertices` if the graph has fewer than 2 vertices
    /// * `DisconnectedGraph` if the edges run out with more than 2 partitions left
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Cut> {
        let outcome = self.contract(rng);
        self.graph.reset();
        outcome
    }

    fn contract<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Cut> {
        let graph = &mut *self.graph;
        if graph.vertex_count() < 2 {
            return Err(GraphError::TooFewVertices(graph.vertex_count()));
        }
        while graph.partition_count() > 2 {
            let edge = graph.random_current_edge(rng).ok_or_else(|| {
                GraphError::DisconnectedGraph {
                    partitions: graph.partition_count(),
                }
            })?;
            graph.merge_edge(edge);
        }
        Ok(capture_cut(graph))
    }
}

fn capture_cut(graph: &Graph) -> Cut {
    let left = graph.active_partitions().next();
    let mut sides = [Vec::new(), Vec::new()];
    for vertex in graph.vertices() {
        let side = if Some(vertex.partition()) == left { 0 } else { 1 };
        sides[side].push(vertex.id());
    }
    for side in &mut sides {
        side.sort_unstable();
    }

    let mut crossing_edges: Vec<Edge> = graph.current_edges().map(|e| graph.edge(e)).collect();
    crossing_edges.sort_unstable();

    Cut {
        size: crossing_edges.len(),
        sides,
        crossing_edges,
    }
}

/// Runs a single trial and returns its cut size. The graph is reset afterwards.
pub fn random_min_cut<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R) -> Result<usize> {
    MinCutTrial::new(graph).run(rng).map(|cut| cut.size)
}

/// Repeats [`MinCutTrial`] and keeps the smallest cut seen.
///
/// Example:
/// ```rust
/// use mincut::graph::{Graph, MinCutEstimator};
///
/// // A 4-cycle: every minimum cut crosses two edges.
/// let mut graph = Graph::from_adjacency(vec![
///     (1, vec![2, 4]),
///     (2, vec![1, 3]),
///     (3, vec![2, 4]),
///     (4, vec![3, 1]),
/// ])
/// .unwrap();
/// let cut = MinCutEstimator::new().seed(42).trials(100).estimate(&mut graph).unwrap();
/// assert_eq!(cut.size, 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MinCutEstimator {
    trials: Option<usize>,
    seed: Option<u64>,
}

impl MinCutEstimator {
    /// Creates an estimator using [`recommended_trials`] and an entropy-derived seed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Fixes the random stream so repeated estimates over the same graph agree.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Runs every trial and returns the smallest cut found.
    ///
    /// # Errors
    /// * `InvalidInput` if zero trials were requested
    /// * any error from [`MinCutTrial::run`], which aborts the estimate
    pub fn estimate(&self, graph: &mut Graph) -> Result<Cut> {
        let trials = self
            .trials
            .unwrap_or_else(|| recommended_trials(graph.vertex_count()));
        if trials == 0 {
            return Err(GraphError::invalid_input("at least one trial is required"));
        }
        let mut rng = match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::seed_from_u64(rand::random()),
        };

        debug!(
            "estimating min cut: {} vertices, {} edges, {} trials",
            graph.vertex_count(),
            graph.base_edges().len(),
            trials
        );

        let mut best: Option<Cut> = None;
        for trial in 0..trials {
            let cut = MinCutTrial::new(graph).run(&mut rng)?;
            trace!("trial {}: cut of size {}", trial, cut.size);
            if best.as_ref().map_or(true, |b| cut.size < b.size) {
                best = Some(cut);
            }
        }

        let best = best.ok_or_else(|| GraphError::invalid_input("no trial completed"))?;
        debug!("best cut after {} trials: {}", trials, best.size);
        Ok(best)
    }

    pub fn estimate_size(&self, graph: &mut Graph) -> Result<usize> {
        self.estimate(graph).map(|cut| cut.size)
    }
}

/// Implements Karger's randomized min cut algorithm.
///
/// # Arguments
/// - `graph`: The graph to cut. It is contracted in place and reset after each trial.
/// - `trials`: Number of independent trials to run (the more, the higher the chance to find the minimum cut).
///
/// # Returns
/// The estimated minimum cut value.
pub fn karger_min_cut(graph: &mut Graph, trials: usize) -> Result<usize> {
    MinCutEstimator::new().trials(trials).estimate_size(graph)
}
