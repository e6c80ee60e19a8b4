use rand::Rng;

use super::error::Error;
use super::graph::{Graph, Vertex, VertexId};

/// One agent of a single generation. Starts on a given vertex, walks a
/// tabu-constrained randomized tour over the graph, and once the tour is
/// closed only `evaluate` and `tour` remain usable. Ants never outlive
/// the generation that spawned them.
#[derive(Clone)]
pub struct Ant {
    current: VertexId,
    visited: Vec<bool>,
    visited_count: usize,
    tour: Vec<VertexId>,
    alpha: f64,
    beta: f64,
    complete: bool,
}

impl Ant {
    pub fn new(graph: &Graph, start: VertexId, alpha: f64, beta: f64) -> Result<Self, Error> {
        graph.vertex(start)?;
        let mut visited = vec![false; graph.total_vertices()];
        let start_idx = index_of(start, &visited)?;
        visited[start_idx] = true;
        Ok(Self {
            current: start,
            visited,
            visited_count: 1,
            tour: vec![start],
            alpha,
            beta,
            complete: false,
        })
    }

    /// Whether the tour has been closed back to its start vertex.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn current(&self) -> VertexId {
        self.current
    }

    /// Take one step. Either picks the next unvisited vertex by roulette
    /// wheel over the desirability of the allowed edges, or, when every
    /// vertex has been visited, closes the loop back to the start.
    pub fn travel<R: Rng>(&mut self, graph: &Graph, rng: &mut R) -> Result<(), Error> {
        if self.complete {
            return Err(Error::TourComplete);
        }

        if self.visited_count == graph.total_vertices() {
            self.tour.push(self.tour[0]);
            self.complete = true;
            return Ok(());
        }

        let next = self.pick_next(graph, rng)?;
        let next_idx = index_of(next, &self.visited)?;
        self.visited[next_idx] = true;
        self.visited_count += 1;
        self.tour.push(next);
        self.current = next;
        Ok(())
    }

    /// Total Euclidean length of the closed tour.
    pub fn evaluate(&self, graph: &Graph) -> Result<f64, Error> {
        if !self.complete {
            return Err(Error::IncompleteTour);
        }
        graph.tour_length(&self.tour)
    }

    /// A copy of the closed tour, start vertex repeated at the end.
    pub fn tour(&self) -> Result<Vec<VertexId>, Error> {
        if !self.complete {
            return Err(Error::IncompleteTour);
        }
        Ok(self.tour.clone())
    }

    fn pick_next<R: Rng>(&self, graph: &Graph, rng: &mut R) -> Result<VertexId, Error> {
        let current = graph.vertex(self.current)?;

        let mut candidates: Vec<(VertexId, f64)> = Vec::new();
        let mut total_weight = 0.0;
        for edge in graph.edges_from(self.current) {
            let far = match edge.opposite_end(self.current) {
                Some(far) => far,
                None => continue,
            };
            if self.visited[index_of(far, &self.visited)?] {
                continue;
            }
            let weight = Self::desirability(
                edge.pheromone(),
                Vertex::distance(current, graph.vertex(far)?),
                self.alpha,
                self.beta,
            );
            total_weight += weight;
            candidates.push((far, weight));
        }

        if candidates.is_empty() {
            return Err(Error::NoAvailableMove);
        }

        // All weights driven to zero (or overflowed): fall back to a
        // uniform draw among the allowed edges instead of failing.
        if !(total_weight > 0.0) || !total_weight.is_finite() {
            return Ok(candidates[rng.gen_range(0..candidates.len())].0);
        }

        let target = rng.gen::<f64>() * total_weight;
        let mut accumulated = 0.0;
        for &(far, weight) in &candidates {
            accumulated += weight;
            if accumulated >= target {
                return Ok(far);
            }
        }
        // Floating-point rounding can leave the accumulator a hair short.
        Ok(candidates[candidates.len() - 1].0)
    }

    fn desirability(pheromone: f64, distance: f64, alpha: f64, beta: f64) -> f64 {
        // Duplicate coordinates make a zero distance possible; floor it
        // so the inverse stays finite.
        let distance = distance.max(f64::EPSILON);
        pheromone.powf(alpha) * (1.0 / distance).powf(beta)
    }
}

fn index_of(id: VertexId, visited: &[bool]) -> Result<usize, Error> {
    // VertexId is an arena index; anything past the end belongs to a
    // different graph.
    let idx = id.index();
    if idx < visited.len() {
        Ok(idx)
    } else {
        Err(Error::UnknownVertex(id))
    }
}
