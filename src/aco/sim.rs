use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::ant::Ant;
use super::error::Error;
use super::graph::{Graph, VertexId};

const BEST_TOUR_LENGTH: f64 = f64::MAX;

/// Run-level ACO parameters, validated on construction so no simulator
/// with out-of-range settings is ever observable.
#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub alpha: f64,
    pub beta: f64,
    pub evaporation_rate: f64,
    pub ants_per_generation: usize,
    pub generations: usize,
}

impl Params {
    pub fn new(
        alpha: f64,
        beta: f64,
        evaporation_rate: f64,
        ants_per_generation: usize,
        generations: usize,
    ) -> Result<Self, Error> {
        // `!(x >= 0.0)` also rejects NaN.
        if !(alpha >= 0.0) || !alpha.is_finite() {
            return Err(Self::out_of_range("alpha", "must be finite and >= 0", alpha));
        }
        if !(beta >= 0.0) || !beta.is_finite() {
            return Err(Self::out_of_range("beta", "must be finite and >= 0", beta));
        }
        if !(0.0..=1.0).contains(&evaporation_rate) {
            return Err(Self::out_of_range(
                "evaporation_rate",
                "must be within [0, 1]",
                evaporation_rate,
            ));
        }
        if ants_per_generation == 0 {
            return Err(Error::InvalidParameter {
                name: "ants_per_generation",
                message: "must be greater than zero".to_string(),
            });
        }
        if generations == 0 {
            return Err(Error::InvalidParameter {
                name: "generations",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            alpha,
            beta,
            evaporation_rate,
            ants_per_generation,
            generations,
        })
    }

    fn out_of_range(name: &'static str, bound: &str, value: f64) -> Error {
        Error::InvalidParameter {
            name,
            message: format!("{}, got {}", bound, value),
        }
    }
}

/// The best closed tour found over all generations.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub best_length: f64,
    pub best_tour: Vec<VertexId>,
}

/// Drives the generational loop: spawn ants on random start vertices,
/// walk each to completion, batch the generation's tours into one
/// pheromone update, and keep the best tour seen so far.
pub struct Simulator<R: Rng> {
    graph: Graph,
    params: Params,
    rng: R,
}

impl Simulator<SmallRng> {
    pub fn on(graph: Graph, params: Params) -> Self {
        Self::with_rng(graph, params, SmallRng::from_entropy())
    }

    /// Seeded construction; two runs with the same seed, graph and
    /// parameters produce identical solutions.
    pub fn seeded(graph: Graph, params: Params, seed: u64) -> Self {
        Self::with_rng(graph, params, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulator<R> {
    pub fn with_rng(graph: Graph, params: Params, rng: R) -> Self {
        Self { graph, params, rng }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn run(&mut self) -> Result<Solution, Error> {
        self.run_with_progress(|_, _| {})
    }

    /// Like [`run`](Self::run), reporting `(generation, best length so
    /// far)` after each generation.
    pub fn run_with_progress<F>(&mut self, mut progress: F) -> Result<Solution, Error>
    where
        F: FnMut(usize, f64),
    {
        if self.graph.is_empty() {
            return Err(Error::NoAvailableMove);
        }

        let mut best_length = BEST_TOUR_LENGTH;
        let mut best_tour: Vec<VertexId> = Vec::new();

        for generation in 1..=self.params.generations {
            let mut completed: Vec<(Vec<VertexId>, f64)> =
                Vec::with_capacity(self.params.ants_per_generation);
            let mut generation_best = BEST_TOUR_LENGTH;
            let mut generation_best_tour: Vec<VertexId> = Vec::new();

            for _ in 0..self.params.ants_per_generation {
                let start = self
                    .graph
                    .random_vertex(&mut self.rng)
                    .ok_or(Error::NoAvailableMove)?;
                let mut ant = Ant::new(&self.graph, start, self.params.alpha, self.params.beta)?;
                while !ant.is_complete() {
                    ant.travel(&self.graph, &mut self.rng)?;
                }

                let length = ant.evaluate(&self.graph)?;
                let tour = ant.tour()?;
                // Ties go to the earlier ant.
                if length < generation_best {
                    generation_best = length;
                    generation_best_tour = tour.clone();
                }
                completed.push((tour, length));
            }

            self.graph
                .update_pheromones(&completed, self.params.evaporation_rate);

            if generation_best < best_length {
                best_length = generation_best;
                best_tour = generation_best_tour;
            }

            progress(generation, best_length);
        }

        Ok(Solution {
            best_length,
            best_tour,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_cities() -> Graph {
        let mut graph = Graph::new();
        graph.add_vertex("A", 0.0, 0.0);
        graph.add_vertex("B", 10.0, 20.0);
        graph.add_vertex("C", 20.0, 30.0);
        graph.add_vertex("D", 50.0, 10.0);
        graph.connect_all();
        graph
    }

    /// Optimal 4-city tour A-B-C-D-A for the fixture above.
    fn optimal_length() -> f64 {
        500f64.sqrt() + 200f64.sqrt() + 1300f64.sqrt() + 2600f64.sqrt()
    }

    #[test]
    fn params_reject_out_of_range_values() {
        assert!(Params::new(-0.1, 5.0, 0.1, 50, 20).is_err());
        assert!(Params::new(1.0, -5.0, 0.1, 50, 20).is_err());
        assert!(Params::new(1.0, 5.0, 1.5, 50, 20).is_err());
        assert!(Params::new(1.0, 5.0, -0.1, 50, 20).is_err());
        assert!(Params::new(f64::NAN, 5.0, 0.1, 50, 20).is_err());
        assert!(Params::new(1.0, 5.0, 0.1, 0, 20).is_err());
        assert!(Params::new(1.0, 5.0, 0.1, 50, 0).is_err());
        assert!(Params::new(0.0, 0.0, 0.0, 1, 1).is_ok());
    }

    #[test]
    fn empty_graph_fails_the_run() {
        let params = Params::new(1.0, 5.0, 0.1, 5, 5).unwrap();
        let mut sim = Simulator::seeded(Graph::new(), params, 1);
        assert_eq!(sim.run(), Err(Error::NoAvailableMove));
    }

    #[test]
    fn single_vertex_graph_yields_trivial_tour() {
        let mut graph = Graph::new();
        let only = graph.add_vertex("solo", 3.0, 4.0);
        let params = Params::new(1.0, 5.0, 0.1, 3, 2).unwrap();
        let mut sim = Simulator::seeded(graph, params, 1);
        let solution = sim.run().unwrap();
        assert_eq!(solution.best_tour, vec![only, only]);
        assert_eq!(solution.best_length, 0.0);
    }

    #[test]
    fn finds_near_optimal_four_city_tour() {
        let params = Params::new(1.0, 5.0, 0.1, 50, 20).unwrap();
        let optimal = optimal_length();
        for seed in [1u64, 17, 4242] {
            let mut sim = Simulator::seeded(four_cities(), params, seed);
            let solution = sim.run().unwrap();
            assert_eq!(solution.best_tour.len(), 5);
            assert_eq!(solution.best_tour[0], solution.best_tour[4]);
            assert!(
                solution.best_length <= optimal * 1.05,
                "seed {}: best length {} vs optimal {}",
                seed,
                solution.best_length,
                optimal
            );
            // Never better than a valid closed tour can be.
            assert!(solution.best_length >= optimal - 1e-9);
        }
    }

    #[test]
    fn seeded_runs_are_bit_identical() {
        let params = Params::new(1.0, 5.0, 0.1, 25, 10).unwrap();
        let mut first = Simulator::seeded(four_cities(), params, 77);
        let mut second = Simulator::seeded(four_cities(), params, 77);
        let a = first.run().unwrap();
        let b = second.run().unwrap();
        assert_eq!(a.best_tour, b.best_tour);
        assert_eq!(a.best_length.to_bits(), b.best_length.to_bits());
    }

    #[test]
    fn progress_callback_fires_once_per_generation() {
        let params = Params::new(1.0, 5.0, 0.1, 10, 7).unwrap();
        let mut sim = Simulator::seeded(four_cities(), params, 3);
        let mut seen: Vec<(usize, f64)> = Vec::new();
        let solution = sim.run_with_progress(|g, best| seen.push((g, best))).unwrap();

        assert_eq!(seen.len(), 7);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[6].0, 7);
        // Best-so-far never worsens and ends at the returned length.
        for pair in seen.windows(2) {
            assert!(pair[1].1 <= pair[0].1);
        }
        assert_eq!(seen[6].1, solution.best_length);
    }
}
