pub mod ant;
pub mod error;
pub mod graph;
pub mod problem;
pub mod sim;

pub use problem::Dataset;
pub use sim::{Params, Simulator};
