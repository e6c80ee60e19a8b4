use std::fmt;

use super::graph::VertexId;

/// Failure conditions of the solver, split by who is at fault: bad
/// configuration fails `Params` construction, graph-shape problems fail
/// the run, and state-machine misuse of `Ant` is a caller defect.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An optimizer parameter is out of its documented range.
    InvalidParameter {
        name: &'static str,
        message: String,
    },
    /// A vertex id does not belong to this graph.
    UnknownVertex(VertexId),
    /// An edge was requested between a vertex and itself.
    SelfLoop(VertexId),
    /// `evaluate` or `tour` was called before the tour was closed.
    IncompleteTour,
    /// `travel` was called after the tour was already closed.
    TourComplete,
    /// An ant has unvisited vertices left but no edge leads to any of
    /// them. On a complete graph this cannot happen; it signals a
    /// malformed graph and aborts the whole run.
    NoAvailableMove,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter `{}`: {}", name, message)
            }
            Error::UnknownVertex(id) => write!(f, "vertex {:?} is not in this graph", id),
            Error::SelfLoop(id) => write!(f, "cannot connect vertex {:?} to itself", id),
            Error::IncompleteTour => write!(f, "tour is not complete yet"),
            Error::TourComplete => write!(f, "tour is already complete"),
            Error::NoAvailableMove => {
                write!(f, "no unvisited vertex is reachable; the graph is not complete")
            }
        }
    }
}

impl std::error::Error for Error {}
