use std::collections::HashMap;

use rand::Rng;

use super::error::Error;

/// Pheromone laid on a fresh edge.
pub const INITIAL_PHEROMONE: f64 = 0.1;

/// Evaporation never drives a trail below this, so desirability
/// computations stay well defined.
pub const MIN_PHEROMONE: f64 = 1e-9;

/// Opaque handle to a vertex, assigned at insertion. Two vertices at the
/// same coordinates are still distinct entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(usize);

impl VertexId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    label: String,
    x: f64,
    y: f64,
}

impl Vertex {
    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(first: &Vertex, second: &Vertex) -> f64 {
        let x = first.x - second.x;
        let y = first.y - second.y;
        (x * x + y * y).sqrt()
    }
}

/// One undirected connection carrying a pheromone trail. A single record
/// serves both directions; only `Graph::update_pheromones` writes to it.
#[derive(Debug, Clone)]
pub struct Edge {
    first: VertexId,
    second: VertexId,
    pheromone: f64,
}

impl Edge {
    pub fn first(&self) -> VertexId {
        self.first
    }

    pub fn second(&self) -> VertexId {
        self.second
    }

    pub fn pheromone(&self) -> f64 {
        self.pheromone
    }

    /// The endpoint on the other side of `vertex`, or `None` if `vertex`
    /// is not an endpoint of this edge.
    pub fn opposite_end(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.first {
            Some(self.second)
        } else if vertex == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

/// Sole owner of all vertices, edges and pheromone state. Ants only read
/// from it while constructing tours; the per-generation pheromone pass is
/// the single mutation point.
///
/// Storage is undirected: one `Edge` record per unordered vertex pair,
/// indexed under the normalized (smaller id, larger id) key, so the two
/// directions can never drift apart.
#[derive(Debug, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    edge_index: HashMap<(VertexId, VertexId), usize>,
    // Per-vertex edge indices in insertion order; feeds the ants'
    // roulette wheel, so the order must be stable.
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn total_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Register a new vertex. Always creates a fresh entity, even if
    /// another vertex already sits at the same coordinates.
    pub fn add_vertex(&mut self, label: impl Into<String>, x: f64, y: f64) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex {
            id,
            label: label.into(),
            x,
            y,
        });
        self.adjacency.push(Vec::new());
        id
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, Error> {
        self.vertices.get(id.0).ok_or(Error::UnknownVertex(id))
    }

    fn contains(&self, id: VertexId) -> bool {
        id.0 < self.vertices.len()
    }

    /// Connect two existing vertices with the default pheromone level.
    /// Re-adding an existing pair, in either order, is a no-op.
    pub fn add_edge(&mut self, first: VertexId, second: VertexId) -> Result<&Edge, Error> {
        self.add_edge_with_pheromone(first, second, INITIAL_PHEROMONE)
    }

    pub fn add_edge_with_pheromone(
        &mut self,
        first: VertexId,
        second: VertexId,
        pheromone: f64,
    ) -> Result<&Edge, Error> {
        if !self.contains(first) {
            return Err(Error::UnknownVertex(first));
        }
        if !self.contains(second) {
            return Err(Error::UnknownVertex(second));
        }
        if first == second {
            return Err(Error::SelfLoop(first));
        }
        if !(pheromone > 0.0) || !pheromone.is_finite() {
            return Err(Error::InvalidParameter {
                name: "pheromone",
                message: format!("must be finite and strictly positive, got {}", pheromone),
            });
        }

        let key = Self::edge_key(first, second);
        let idx = match self.edge_index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.edges.len();
                self.edges.push(Edge {
                    first,
                    second,
                    pheromone,
                });
                self.edge_index.insert(key, idx);
                self.adjacency[first.0].push(idx);
                self.adjacency[second.0].push(idx);
                idx
            }
        };

        Ok(&self.edges[idx])
    }

    /// Connect every unordered pair of vertices, making the graph
    /// complete. Idempotent on already-connected pairs.
    pub fn connect_all(&mut self) {
        for i in 0..self.vertices.len() {
            for j in i + 1..self.vertices.len() {
                let key = (VertexId(i), VertexId(j));
                if self.edge_index.contains_key(&key) {
                    continue;
                }
                let idx = self.edges.len();
                self.edges.push(Edge {
                    first: VertexId(i),
                    second: VertexId(j),
                    pheromone: INITIAL_PHEROMONE,
                });
                self.edge_index.insert(key, idx);
                self.adjacency[i].push(idx);
                self.adjacency[j].push(idx);
            }
        }
    }

    /// All edges incident to `vertex`, in insertion order.
    pub fn edges_from(&self, vertex: VertexId) -> impl Iterator<Item = &Edge> {
        self.adjacency
            .get(vertex.0)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Symmetric lookup: the stored direction of the pair does not matter.
    pub fn edge_between(&self, first: VertexId, second: VertexId) -> Option<&Edge> {
        self.edge_index
            .get(&Self::edge_key(first, second))
            .map(|&idx| &self.edges[idx])
    }

    /// Uniformly random vertex, used to place ants at the start of a
    /// generation. `None` on an empty graph.
    pub fn random_vertex<R: Rng>(&self, rng: &mut R) -> Option<VertexId> {
        if self.vertices.is_empty() {
            None
        } else {
            Some(VertexId(rng.gen_range(0..self.vertices.len())))
        }
    }

    pub fn distance_between(&self, first: VertexId, second: VertexId) -> Result<f64, Error> {
        Ok(Vertex::distance(self.vertex(first)?, self.vertex(second)?))
    }

    /// Total Euclidean length of a path over consecutive vertices.
    pub fn tour_length(&self, tour: &[VertexId]) -> Result<f64, Error> {
        let mut length = 0.0;
        for pair in tour.windows(2) {
            length += self.distance_between(pair[0], pair[1])?;
        }
        Ok(length)
    }

    /// Apply one generation's pheromone update: a single evaporation pass
    /// over every edge, clamped at `MIN_PHEROMONE`, then one deposit of
    /// `1 / tour_length` on each edge of each completed tour.
    ///
    /// Deposits are batched per generation rather than applied ant by
    /// ant, so the result does not depend on the order the tours are
    /// listed in and a seeded run reproduces exactly.
    pub fn update_pheromones(&mut self, tours: &[(Vec<VertexId>, f64)], evaporation_rate: f64) {
        let decay = 1.0 - evaporation_rate;
        for edge in &mut self.edges {
            edge.pheromone = (edge.pheromone * decay).max(MIN_PHEROMONE);
        }

        for (tour, length) in tours {
            if *length <= 0.0 {
                continue;
            }
            let deposit = 1.0 / length;
            for pair in tour.windows(2) {
                if let Some(&idx) = self.edge_index.get(&Self::edge_key(pair[0], pair[1])) {
                    self.edges[idx].pheromone += deposit;
                }
            }
        }
    }

    fn edge_key(first: VertexId, second: VertexId) -> (VertexId, VertexId) {
        if first <= second {
            (first, second)
        } else {
            (second, first)
        }
    }
}
