//! pathwise-ranker — Seed selection, score merging and the end-to-end pipeline.

pub mod merge;
pub mod seeds;
pub mod output;
pub mod pipeline;

pub use merge::merge;
pub use seeds::{select_seeds, DiseaseGeneScore};
pub use pipeline::{run, run_from_config, PipelineInputs, PipelineOutcome, RunSummary};
