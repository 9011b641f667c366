//! Configuration loading for pathwise.
//! Reads pathwise.toml from the current directory, or the path given with
//! `--config` / the PATHWISE_CONFIG env var, then applies command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use pathwise_common::{GeneUniverse, LayerConfig, MappingFormat, PipelineConfig};

pub const CONFIG_ENV: &str = "PATHWISE_CONFIG";
pub const DEFAULT_CONFIG: &str = "pathwise.toml";

/// Load the run configuration.
///
/// An explicit path must exist. Without one, `pathwise.toml` in the current
/// directory is used when present and built-in defaults otherwise.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: {}\n\
                     Copy pathwise.example.toml to pathwise.toml and edit it.",
                    path.display()
                );
            }
            path.to_path_buf()
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.exists() {
                tracing::debug!("No {DEFAULT_CONFIG} found; using built-in defaults");
                return Ok(PipelineConfig::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = PipelineConfig::from_toml_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    tracing::info!(file = %path.display(), "Configuration loaded");
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MappingArg {
    Reactome,
    Gmt,
}

impl From<MappingArg> for MappingFormat {
    fn from(arg: MappingArg) -> Self {
        match arg {
            MappingArg::Reactome => MappingFormat::Reactome,
            MappingArg::Gmt => MappingFormat::Gmt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UniverseArg {
    Union,
    Intersection,
}

impl From<UniverseArg> for GeneUniverse {
    fn from(arg: UniverseArg) -> Self {
        match arg {
            UniverseArg::Union => GeneUniverse::Union,
            UniverseArg::Intersection => GeneUniverse::Intersection,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Target gene symbol (e.g., BTG4)
    #[arg(long, short)]
    pub target: Option<String>,

    /// Gene→pathway mapping file
    #[arg(long, value_name = "FILE")]
    pub pathway_mapping: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub mapping_format: Option<MappingArg>,

    /// Species kept from a Reactome mapping
    #[arg(long)]
    pub species: Option<String>,

    /// Disease pathway IDs, one per line
    #[arg(long, value_name = "FILE")]
    pub disease_pathways: Option<PathBuf>,

    /// GSEA result table to filter into disease pathways
    #[arg(long, value_name = "FILE")]
    pub gsea_results: Option<PathBuf>,

    /// Disease gene scores (symbol, globalScore) used for seeding
    #[arg(long, value_name = "FILE")]
    pub disease_genes: Option<PathBuf>,

    /// Interaction network layer; repeat for a multiplex walk.
    /// Replaces any layers from the config file.
    #[arg(long = "interactions", value_name = "FILE")]
    pub interactions: Vec<PathBuf>,

    #[arg(long, value_enum)]
    pub universe: Option<UniverseArg>,

    #[arg(long)]
    pub fdr_threshold: Option<f64>,

    #[arg(long)]
    pub pval_threshold: Option<f64>,

    #[arg(long)]
    pub restart_prob: Option<f64>,

    #[arg(long)]
    pub max_iters: Option<usize>,

    #[arg(long)]
    pub tol: Option<f64>,

    /// Number of top disease genes seeded alongside the target
    #[arg(long)]
    pub top_disease_genes: Option<usize>,

    /// Rank on pathway selectivity alone
    #[arg(long)]
    pub no_propagation: bool,

    /// Ranked table destination ("-" for stdout)
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON run summary destination
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        let inputs = &mut config.inputs;
        if let Some(v) = &self.target { inputs.target = Some(v.clone()); }
        if let Some(v) = &self.pathway_mapping { inputs.pathway_mapping = Some(v.clone()); }
        if let Some(v) = self.mapping_format { inputs.mapping_format = v.into(); }
        if let Some(v) = &self.species { inputs.species = v.clone(); }
        if let Some(v) = &self.disease_pathways { inputs.disease_pathways = Some(v.clone()); }
        if let Some(v) = &self.gsea_results { inputs.gsea_results = Some(v.clone()); }
        if let Some(v) = &self.disease_genes { inputs.disease_genes = Some(v.clone()); }

        if let Some(v) = self.universe { config.selectivity.universe = v.into(); }
        if let Some(v) = self.fdr_threshold { config.enrichment.fdr_threshold = Some(v); }
        if let Some(v) = self.pval_threshold { config.enrichment.pval_threshold = Some(v); }

        let propagation = &mut config.propagation;
        if !self.interactions.is_empty() {
            propagation.layers = self
                .interactions
                .iter()
                .map(|path| LayerConfig { name: None, path: path.clone(), weight: 1.0 })
                .collect();
        }
        if let Some(v) = self.restart_prob { propagation.restart_prob = v; }
        if let Some(v) = self.max_iters { propagation.max_iters = v; }
        if let Some(v) = self.tol { propagation.tol = v; }
        if self.no_propagation { propagation.enabled = false; }

        if let Some(v) = self.top_disease_genes { config.seeds.top_disease_genes = v; }
        if let Some(v) = &self.output { config.output.path = Some(v.clone()); }
        if let Some(v) = &self.summary { config.output.summary = Some(v.clone()); }
    }
}
