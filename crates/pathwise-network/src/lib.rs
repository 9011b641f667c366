//! pathwise-network — Functional interaction graphs and random walk with restart.

pub mod graph;
pub mod interactions;
pub mod propagate;
pub mod multiplex;
pub mod weights;

pub use graph::{GraphBuildReport, InteractionGraph, InteractionRow, PropagationLayer};
pub use propagate::{propagate, PropagationResult, RwrParams};
pub use multiplex::Multiplex;
pub use weights::LayerWeights;
