use std::{fmt::Debug, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use aco::{Dataset, Params, Simulator};

mod aco;

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// TSPLIB-style EUC_2D instance file
    #[clap(short, long, conflicts_with = "cities")]
    tsp: Option<PathBuf>,

    /// Plain city list, one "<label> <x> <y>" per line
    #[clap(short, long)]
    cities: Option<PathBuf>,

    /// Number of ants per generation
    #[clap(short, long, default_value_t = 25)]
    ants: usize,

    /// Number of generations
    #[clap(short, long, default_value_t = 10)]
    generations: usize,

    /// Pheromone influence exponent
    #[clap(short = 'A', long, default_value_t = 1.0)]
    alpha: f64,

    /// Distance influence exponent
    #[clap(short = 'B', long, default_value_t = 5.0)]
    beta: f64,

    /// Fraction of pheromone removed per generation, within [0, 1]
    #[clap(short, long, default_value_t = 0.5)]
    evaporation: f64,

    /// RNG seed for a reproducible run
    #[clap(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dataset = match (&args.tsp, &args.cities) {
        (Some(path), _) => Dataset::try_from_tsp_file(path)?,
        (None, Some(path)) => Dataset::try_from_lines_file(path)?,
        (None, None) => Dataset::oliver30(),
    };
    let name = dataset.name.clone();
    let graph = dataset.into_graph();

    let params = Params::new(
        args.alpha,
        args.beta,
        args.evaporation,
        args.ants,
        args.generations,
    )?;

    let mut simulator = match args.seed {
        Some(seed) => Simulator::seeded(graph, params, seed),
        None => Simulator::on(graph, params),
    };

    println!(
        "Finding optimum tour for {} ({} ants, {} generations)",
        name, args.ants, args.generations
    );

    let now = std::time::Instant::now();
    let solution = simulator.run_with_progress(|generation, best| {
        println!(
            "Generation {} of {}, best tour so far: {:.2}",
            generation, args.generations, best
        );
    })?;
    let time = now.elapsed();

    let route: Vec<&str> = solution
        .best_tour
        .iter()
        .filter_map(|&id| simulator.graph().vertex(id).ok())
        .map(|v| v.label())
        .collect();

    println!("Finished, best tour length is {:.2}", solution.best_length);
    println!("{}", route.join(" -> "));
    println!("Took {:?}", time);

    Ok(())
}
