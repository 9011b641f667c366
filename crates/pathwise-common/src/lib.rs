//! pathwise-common — Shared types, errors, and configuration used across all pathwise crates.

pub mod error;
pub mod entities;
pub mod pipeline_config;
pub mod tsv;

// Re-export commonly used types
pub use error::{PathwiseError, Result};
pub use entities::{GeneSymbol, PathwayId, ScoreRecord, SkippedRows};
pub use pipeline_config::{
    PipelineConfig, InputsConfig, EnrichmentConfig, SelectivityConfig, PropagationConfig,
    LayerConfig, SeedConfig, OutputConfig, MappingFormat, GeneUniverse,
};
