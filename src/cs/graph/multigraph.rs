use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

use crate::error::{GraphError, Result};

/// Caller-facing vertex identity.
pub type VertexId = usize;

/// Position of an edge in the graph's edge arena. Stable for the lifetime of the graph.
pub type EdgeIndex = usize;

/// An undirected edge between two distinct vertices, stored lower id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: VertexId,
    b: VertexId,
}

impl Edge {
    /// Creates the edge `{u, v}` in canonical order.
    ///
    /// # Errors
    /// * `SelfLoop` if `u == v`
    pub fn new(u: VertexId, v: VertexId) -> Result<Self> {
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }
        Ok(Self {
            a: u.min(v),
            b: u.max(v),
        })
    }

    pub fn a(&self) -> VertexId {
        self.a
    }

    pub fn b(&self) -> VertexId {
        self.b
    }

    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.a, self.b)
    }
}

/// A vertex with its current partition and the current edges touching it.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    partition: VertexId,
    incident_edges: BTreeSet<EdgeIndex>,
}

impl Vertex {
    fn new(id: VertexId) -> Self {
        Self {
            id,
            partition: id,
            incident_edges: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn partition(&self) -> VertexId {
        self.partition
    }

    pub fn incident_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.incident_edges.iter().copied()
    }

    pub fn degree(&self) -> usize {
        self.incident_edges.len()
    }
}

/// How repeated declarations of the same unordered pair are turned into edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultiEdgePolicy {
    /// One edge per unordered pair, however often it is declared.
    #[default]
    Collapse,
    /// `{u, v}` gets as many parallel edges as the larger of the two declaration counts
    /// (`v` in `u`'s record, `u` in `v`'s record), so a symmetric listing still yields
    /// a single edge.
    Preserve,
}

/// One line of adjacency input: a vertex and the vertices it shares an edge with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyRecord {
    pub id: VertexId,
    pub neighbors: Vec<VertexId>,
}

impl AdjacencyRecord {
    pub fn new(id: VertexId, neighbors: Vec<VertexId>) -> Self {
        Self { id, neighbors }
    }
}

impl From<(VertexId, Vec<VertexId>)> for AdjacencyRecord {
    fn from((id, neighbors): (VertexId, Vec<VertexId>)) -> Self {
        Self { id, neighbors }
    }
}

impl From<(VertexId, &[VertexId])> for AdjacencyRecord {
    fn from((id, neighbors): (VertexId, &[VertexId])) -> Self {
        Self {
            id,
            neighbors: neighbors.to_vec(),
        }
    }
}

/// Builds a [`Graph`] from adjacency records.
///
/// Example:
/// ```rust
/// use mincut::graph::{GraphBuilder, MultiEdgePolicy};
///
/// let graph = GraphBuilder::new()
///     .multi_edge_policy(MultiEdgePolicy::Preserve)
///     .build(vec![(1, vec![2, 2]), (2, vec![1])])
///     .unwrap();
/// assert_eq!(graph.base_edges().len(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    policy: MultiEdgePolicy,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn multi_edge_policy(mut self, policy: MultiEdgePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates every vertex, then one edge per unordered pair found in the records
    /// (more under [`MultiEdgePolicy::Preserve`]), and leaves the graph ready for a trial.
    ///
    /// # Errors
    /// * `DuplicateVertex` if two records share an id
    /// * `UnknownVertex` if a neighbor is never declared as a record's own id
    /// * `SelfLoop` if a record lists its own id
    pub fn build<I, R>(self, records: I) -> Result<Graph>
    where
        I: IntoIterator<Item = R>,
        R: Into<AdjacencyRecord>,
    {
        let records: Vec<AdjacencyRecord> = records.into_iter().map(Into::into).collect();

        let mut vertices = Vec::with_capacity(records.len());
        let mut index_of = HashMap::with_capacity(records.len());
        for record in &records {
            if index_of.insert(record.id, vertices.len()).is_some() {
                return Err(GraphError::DuplicateVertex(record.id));
            }
            vertices.push(Vertex::new(record.id));
        }

        // Pairs in first-seen order, plus per-direction declaration counts.
        let mut pairs: Vec<Edge> = Vec::new();
        let mut declared: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for record in &records {
            for &neighbor in &record.neighbors {
                if !index_of.contains_key(&neighbor) {
                    return Err(GraphError::UnknownVertex {
                        vertex: record.id,
                        neighbor,
                    });
                }
                let edge = Edge::new(record.id, neighbor)?;
                let forward = record.id == edge.a;
                let seen_before = declared.contains_key(&(edge.a, edge.b))
                    || declared.contains_key(&(edge.b, edge.a));
                if !seen_before {
                    pairs.push(edge);
                }
                let key = if forward {
                    (edge.a, edge.b)
                } else {
                    (edge.b, edge.a)
                };
                *declared.entry(key).or_insert(0) += 1;
            }
        }

        let mut base_edges = Vec::with_capacity(pairs.len());
        let mut ends = Vec::with_capacity(pairs.len());
        for edge in pairs {
            let multiplicity = match self.policy {
                MultiEdgePolicy::Collapse => 1,
                MultiEdgePolicy::Preserve => {
                    let ab = declared.get(&(edge.a, edge.b)).copied().unwrap_or(0);
                    let ba = declared.get(&(edge.b, edge.a)).copied().unwrap_or(0);
                    ab.max(ba)
                }
            };
            for _ in 0..multiplicity {
                base_edges.push(edge);
                ends.push([index_of[&edge.a], index_of[&edge.b]]);
            }
        }

        let edge_count = base_edges.len();
        let mut graph = Graph {
            vertices,
            index_of,
            base_edges,
            ends,
            current_edges: Vec::with_capacity(edge_count),
            slot: vec![None; edge_count],
            active_partitions: BTreeSet::new(),
        };
        graph.init_edges();
        graph.init_partitions();

        debug!(
            "built graph with {} vertices and {} edges ({:?})",
            graph.vertex_count(),
            edge_count,
            self.policy
        );
        Ok(graph)
    }
}

/// An undirected multigraph that can be contracted in place and restored.
///
/// Vertices and edges live in flat arenas. Edges are referenced by their
/// [`EdgeIndex`] into the write-once base edge list; the current edge set is the
/// subset still alive in the running trial.
#[derive(Debug, Clone)]
pub struct Graph {
    vertices: Vec<Vertex>,
    index_of: HashMap<VertexId, usize>,
    base_edges: Vec<Edge>,
    // Arena positions of each base edge's endpoints.
    ends: Vec<[usize; 2]>,
    current_edges: Vec<EdgeIndex>,
    // Position of each edge in `current_edges`, `None` once removed.
    slot: Vec<Option<usize>>,
    active_partitions: BTreeSet<VertexId>,
}

impl Graph {
    /// Builds a graph with the default [`MultiEdgePolicy::Collapse`].
    ///
    /// # Examples
    /// ```
    /// use mincut::graph::Graph;
    ///
    /// let graph = Graph::from_adjacency(vec![
    ///     (1, vec![3, 4]),
    ///     (2, vec![4]),
    ///     (3, vec![1]),
    ///     (4, vec![1, 2]),
    /// ])
    /// .unwrap();
    /// assert_eq!(graph.vertex_count(), 4);
    /// assert_eq!(graph.base_edges().len(), 3);
    /// ```
    pub fn from_adjacency<I, R>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<AdjacencyRecord>,
    {
        GraphBuilder::new().build(records)
    }

    /// Copies the base edges into the current set and rebuilds every incident set.
    fn init_edges(&mut self) {
        for vertex in &mut self.vertices {
            vertex.incident_edges.clear();
        }
        self.current_edges.clear();
        for (e, &[ia, ib]) in self.ends.iter().enumerate() {
            self.slot[e] = Some(self.current_edges.len());
            self.current_edges.push(e);
            self.vertices[ia].incident_edges.insert(e);
            self.vertices[ib].incident_edges.insert(e);
        }
    }

    /// Puts every vertex back in its own partition.
    fn init_partitions(&mut self) {
        self.active_partitions.clear();
        for vertex in &mut self.vertices {
            vertex.partition = vertex.id;
            self.active_partitions.insert(vertex.id);
        }
    }

    /// Restores the state the graph had right after construction.
    pub fn reset(&mut self) {
        self.init_edges();
        self.init_partitions();
    }

    /// Contracts the two partitions joined by `edge` and purges the self-loops this creates.
    ///
    /// The partition of the edge's lower endpoint survives. If both endpoints already share
    /// a partition the edge is only dropped.
    ///
    /// Returns `true` if two partitions were merged.
    ///
    /// # Panics
    /// If `edge` is not in the current edge set.
    pub fn merge_edge(&mut self, edge: EdgeIndex) -> bool {
        assert!(
            self.is_current_edge(edge),
            "merge_edge called with edge {} which is not in the current edge set",
            edge
        );
        let [ia, ib] = self.ends[edge];
        let survivor = self.vertices[ia].partition;
        let absorbed = self.vertices[ib].partition;

        if survivor == absorbed {
            self.detach(edge);
            self.remove_current(edge);
            return false;
        }

        for vertex in &mut self.vertices {
            if vertex.partition == absorbed {
                vertex.partition = survivor;
            }
        }
        self.active_partitions.remove(&absorbed);
        self.detach(edge);
        self.remove_current(edge);

        let purged = self.remove_loops();
        trace!(
            "contracted edge {} ({} <- {}), purged {} loops, {} partitions left",
            edge,
            survivor,
            absorbed,
            purged,
            self.active_partitions.len()
        );
        true
    }

    /// Drops every current edge whose endpoints share a partition. Returns how many went.
    fn remove_loops(&mut self) -> usize {
        let loops: Vec<EdgeIndex> = self
            .current_edges
            .iter()
            .copied()
            .filter(|&e| self.is_loop(e))
            .collect();
        for &e in &loops {
            self.detach(e);
            self.remove_current(e);
        }
        loops.len()
    }

    fn is_loop(&self, edge: EdgeIndex) -> bool {
        let [ia, ib] = self.ends[edge];
        self.vertices[ia].partition == self.vertices[ib].partition
    }

    fn detach(&mut self, edge: EdgeIndex) {
        let [ia, ib] = self.ends[edge];
        self.vertices[ia].incident_edges.remove(&edge);
        self.vertices[ib].incident_edges.remove(&edge);
    }

    fn remove_current(&mut self, edge: EdgeIndex) {
        if let Some(pos) = self.slot[edge].take() {
            self.current_edges.swap_remove(pos);
            if let Some(&moved) = self.current_edges.get(pos) {
                self.slot[moved] = Some(pos);
            }
        }
    }

    /// Picks a current edge uniformly at random, or `None` if none are left.
    pub fn random_current_edge<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<EdgeIndex> {
        self.current_edges.choose(rng).copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The edges built at construction, indexed by [`EdgeIndex`]. Never modified.
    pub fn base_edges(&self) -> &[Edge] {
        &self.base_edges
    }

    /// # Panics
    /// If `index` is not a valid edge index.
    pub fn edge(&self, index: EdgeIndex) -> Edge {
        self.base_edges[index]
    }

    pub fn current_edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.current_edges.iter().copied()
    }

    pub fn current_edge_count(&self) -> usize {
        self.current_edges.len()
    }

    pub fn is_current_edge(&self, index: EdgeIndex) -> bool {
        matches!(self.slot.get(index), Some(Some(_)))
    }

    pub fn partition_count(&self) -> usize {
        self.active_partitions.len()
    }

    pub fn active_partitions(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.active_partitions.iter().copied()
    }

    pub fn is_partitioned_in_two(&self) -> bool {
        self.active_partitions.len() == 2
    }

    pub fn partition_of(&self, id: VertexId) -> Option<VertexId> {
        self.vertex(id).map(Vertex::partition)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index_of.get(&id).map(|&i| &self.vertices[i])
    }

    /// Vertices in declaration order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    /// Every vertex with the indices of the current edges touching it.
    pub fn incidence(&self) -> Vec<(VertexId, Vec<EdgeIndex>)> {
        self.vertices
            .iter()
            .map(|v| (v.id, v.incident_edges().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph {
        // 3 - 1 - 4 - 2
        Graph::from_adjacency(vec![
            (1, vec![3, 4]),
            (2, vec![4]),
            (3, vec![1]),
            (4, vec![1, 2]),
        ])
        .unwrap()
    }

    fn edge_index(graph: &Graph, u: VertexId, v: VertexId) -> EdgeIndex {
        let target = Edge::new(u, v).unwrap();
        graph.base_edges().iter().position(|&e| e == target).unwrap()
    }

    fn assert_incidence_consistent(graph: &Graph) {
        for (id, incident) in graph.incidence() {
            for e in &incident {
                assert!(graph.is_current_edge(*e));
                let (a, b) = graph.edge(*e).endpoints();
                assert!(a == id || b == id);
            }
        }
        for e in graph.current_edges() {
            let (a, b) = graph.edge(e).endpoints();
            assert!(graph.vertex(a).unwrap().incident_edges().any(|x| x == e));
            assert!(graph.vertex(b).unwrap().incident_edges().any(|x| x == e));
        }
    }

    #[test]
    fn test_edge_canonical_order() {
        let e = Edge::new(7, 2).unwrap();
        assert_eq!(e.endpoints(), (2, 7));
        assert_eq!(e, Edge::new(2, 7).unwrap());
        assert_eq!(Edge::new(3, 3), Err(GraphError::SelfLoop(3)));
    }

    #[test]
    fn test_build_dedups_symmetric_declarations() {
        let graph = path_graph();
        assert_eq!(graph.vertex_count(), 4);
        let mut edges: Vec<_> = graph.base_edges().iter().map(Edge::endpoints).collect();
        edges.sort();
        assert_eq!(edges, vec![(1, 3), (1, 4), (2, 4)]);
        assert_eq!(graph.current_edge_count(), 3);
        assert_eq!(graph.partition_count(), 4);
        assert_eq!(graph.vertex(1).unwrap().degree(), 2);
        assert_incidence_consistent(&graph);
    }

    #[test]
    fn test_build_keeps_one_sided_declarations() {
        let graph = Graph::from_adjacency(vec![(1, vec![]), (2, vec![1])]).unwrap();
        assert_eq!(graph.base_edges(), &[Edge::new(1, 2).unwrap()]);
    }

    #[test]
    fn test_build_unknown_vertex() {
        let result = Graph::from_adjacency(vec![(1, vec![2]), (2, vec![1, 9])]);
        assert!(matches!(
            result,
            Err(GraphError::UnknownVertex {
                vertex: 2,
                neighbor: 9
            })
        ));
    }

    #[test]
    fn test_build_duplicate_vertex() {
        let result = Graph::from_adjacency(vec![(1, vec![2]), (2, vec![1]), (1, vec![])]);
        assert!(matches!(result, Err(GraphError::DuplicateVertex(1))));
    }

    #[test]
    fn test_build_self_loop() {
        let result = Graph::from_adjacency(vec![(1, vec![1, 2]), (2, vec![1])]);
        assert!(matches!(result, Err(GraphError::SelfLoop(1))));
    }

    #[test]
    fn test_multi_edge_policy() {
        let records = vec![(1, vec![2, 2, 3]), (2, vec![1]), (3, vec![1])];
        let collapsed = Graph::from_adjacency(records.clone()).unwrap();
        assert_eq!(collapsed.base_edges().len(), 2);

        let preserved = GraphBuilder::new()
            .multi_edge_policy(MultiEdgePolicy::Preserve)
            .build(records)
            .unwrap();
        assert_eq!(preserved.base_edges().len(), 3);
        let parallel = preserved
            .base_edges()
            .iter()
            .filter(|e| e.endpoints() == (1, 2))
            .count();
        assert_eq!(parallel, 2);
        assert_incidence_consistent(&preserved);
    }

    #[test]
    fn test_merge_edge_contracts() {
        let mut graph = path_graph();
        let e = edge_index(&graph, 1, 4);
        assert!(graph.merge_edge(e));
        assert_eq!(graph.partition_count(), 3);
        assert_eq!(graph.partition_of(4), Some(1));
        assert_eq!(graph.partition_of(1), Some(1));
        assert!(!graph.is_current_edge(e));
        assert_eq!(graph.current_edge_count(), 2);
        assert_incidence_consistent(&graph);
    }

    #[test]
    fn test_merge_edge_absorbs_whole_partition() {
        let mut graph = path_graph();
        graph.merge_edge(edge_index(&graph, 2, 4));
        graph.merge_edge(edge_index(&graph, 1, 4));
        // Both 2 and 4 follow the surviving partition of 1.
        assert_eq!(graph.partition_of(2), Some(1));
        assert_eq!(graph.partition_of(4), Some(1));
        assert!(graph.is_partitioned_in_two());
        assert_eq!(graph.current_edge_count(), 1);
    }

    #[test]
    fn test_merge_purges_parallel_edges() {
        let mut graph = GraphBuilder::new()
            .multi_edge_policy(MultiEdgePolicy::Preserve)
            .build(vec![(1, vec![2, 2, 3]), (2, vec![1, 1, 3]), (3, vec![1, 2])])
            .unwrap();
        assert_eq!(graph.current_edge_count(), 4);
        let e = edge_index(&graph, 1, 2);
        assert!(graph.merge_edge(e));
        // The twin of the contracted edge became a loop and must be gone.
        assert_eq!(graph.current_edge_count(), 2);
        for idx in graph.current_edges() {
            let (a, b) = graph.edge(idx).endpoints();
            assert_ne!(graph.partition_of(a), graph.partition_of(b));
        }
        assert_incidence_consistent(&graph);
    }

    #[test]
    fn test_merge_triangle_leaves_crossing_edges() {
        let mut graph =
            Graph::from_adjacency(vec![(1, vec![2, 3]), (2, vec![3]), (3, vec![])]).unwrap();
        graph.merge_edge(edge_index(&graph, 1, 2));
        assert!(graph.is_partitioned_in_two());
        assert_eq!(graph.current_edge_count(), 2);
    }

    #[test]
    #[should_panic(expected = "not in the current edge set")]
    fn test_merge_removed_edge_panics() {
        let mut graph = path_graph();
        let e = edge_index(&graph, 1, 3);
        graph.merge_edge(e);
        graph.merge_edge(e);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut graph = path_graph();
        let base = graph.base_edges().to_vec();
        graph.merge_edge(edge_index(&graph, 1, 3));
        graph.merge_edge(edge_index(&graph, 2, 4));

        graph.reset();
        graph.reset();

        assert_eq!(graph.base_edges(), base.as_slice());
        let mut current: Vec<_> = graph.current_edges().collect();
        current.sort();
        assert_eq!(current, (0..base.len()).collect::<Vec<_>>());
        for v in graph.vertices() {
            assert_eq!(v.partition(), v.id());
        }
        assert_eq!(graph.partition_count(), 4);
        assert_incidence_consistent(&graph);
    }

    #[test]
    fn test_random_current_edge() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha20Rng;

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let graph = path_graph();
        for _ in 0..20 {
            let e = graph.random_current_edge(&mut rng).unwrap();
            assert!(graph.is_current_edge(e));
        }
        let empty = Graph::from_adjacency(vec![(1, vec![]), (2, vec![])]).unwrap();
        assert_eq!(empty.random_current_edge(&mut rng), None);
    }
}
