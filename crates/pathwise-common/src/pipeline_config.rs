//! Run configuration for a pathwise pipeline invocation.
//!
//! Every tunable the engine uses (seed counts, restart probability, input
//! paths) lives here and is passed down explicitly. Nothing in the scorer or
//! propagator reads a module-level default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PathwiseError, Result};

/// Complete pipeline configuration, usually read from `pathwise.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input tables and the target gene
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Filters applied to an upstream GSEA result table
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Pathway selectivity options
    #[serde(default)]
    pub selectivity: SelectivityConfig,

    /// Random walk with restart options
    #[serde(default)]
    pub propagation: PropagationConfig,

    /// Seed selection
    #[serde(default)]
    pub seeds: SeedConfig,

    /// Output options
    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.propagation;
        if !(p.restart_prob > 0.0 && p.restart_prob < 1.0) {
            return Err(PathwiseError::InvalidConfig(format!(
                "propagation.restart_prob must be in (0, 1), got {}",
                p.restart_prob
            )));
        }
        if !(p.tol > 0.0) {
            return Err(PathwiseError::InvalidConfig(format!(
                "propagation.tol must be positive, got {}",
                p.tol
            )));
        }
        if p.max_iters == 0 {
            return Err(PathwiseError::InvalidConfig(
                "propagation.max_iters must be at least 1".to_string(),
            ));
        }
        for layer in &p.layers {
            if !(layer.weight >= 0.0) {
                return Err(PathwiseError::InvalidConfig(format!(
                    "layer {} has invalid weight {}",
                    layer.display_name(),
                    layer.weight
                )));
            }
        }
        if p.enabled && !p.layers.is_empty() && p.layers.iter().all(|l| l.weight == 0.0) {
            return Err(PathwiseError::InvalidConfig(
                "all propagation layers have zero weight".to_string(),
            ));
        }

        let e = &self.enrichment;
        for (name, value) in [("pval_threshold", e.pval_threshold), ("fdr_threshold", e.fdr_threshold)] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(PathwiseError::InvalidConfig(format!(
                        "enrichment.{name} must be in [0, 1], got {v}"
                    )));
                }
            }
        }

        if let Some(target) = &self.inputs.target {
            if target.trim().is_empty() {
                return Err(PathwiseError::InvalidConfig("inputs.target is empty".to_string()));
            }
        }
        Ok(())
    }
}

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Format of the gene→pathway mapping file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingFormat {
    /// Reactome lowest-level mapping dump, 8 tab-separated columns
    #[default]
    Reactome,
    /// GMT gene set library
    Gmt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    /// Target gene symbol (e.g., "BTG4")
    pub target: Option<String>,

    /// Gene→pathway mapping file
    pub pathway_mapping: Option<PathBuf>,

    #[serde(default)]
    pub mapping_format: MappingFormat,

    /// Species kept from a Reactome mapping dump
    #[serde(default = "default_species")]
    pub species: String,

    /// Pre-filtered disease pathway IDs, one per line
    pub disease_pathways: Option<PathBuf>,

    /// Raw GSEA result table; filtered with `[enrichment]`
    pub gsea_results: Option<PathBuf>,

    /// Disease gene scores (`symbol`, `globalScore`) used for seeding
    pub disease_genes: Option<PathBuf>,
}

fn default_species() -> String { "Homo sapiens".to_string() }

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            target: None,
            pathway_mapping: None,
            mapping_format: MappingFormat::default(),
            species: default_species(),
            disease_pathways: None,
            gsea_results: None,
            disease_genes: None,
        }
    }
}

// ── Enrichment filtering ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Keep pathways with pval <= threshold
    pub pval_threshold: Option<f64>,

    /// Keep pathways with qval <= threshold
    pub fdr_threshold: Option<f64>,

    /// Additionally require NES > 0
    #[serde(default)]
    pub nes_positive: bool,
}

// ── Selectivity ──────────────────────────────────────────────────────────────

/// Which genes are scored for pathway selectivity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneUniverse {
    /// Genes on any disease or target pathway
    #[default]
    Union,
    /// Genes on at least one disease pathway and at least one target pathway
    Intersection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectivityConfig {
    #[serde(default)]
    pub universe: GeneUniverse,
}

// ── Propagation ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Skip network propagation entirely when false
    #[serde(default = "bool_true")]
    pub enabled: bool,

    #[serde(default = "default_restart_prob")]
    pub restart_prob: f64,

    #[serde(default = "default_max_iters")]
    pub max_iters: usize,

    #[serde(default = "default_tol")]
    pub tol: f64,

    /// Node count above which the transition product runs on the rayon pool
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Interaction network layers; more than one makes the walk multiplex
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

fn bool_true() -> bool { true }
fn default_restart_prob() -> f64 { 0.7 }
fn default_max_iters() -> usize { 100 }
fn default_tol() -> f64 { 1e-6 }
fn default_parallel_threshold() -> usize { 5_000 }

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            restart_prob: default_restart_prob(),
            max_iters: default_max_iters(),
            tol: default_tol(),
            parallel_threshold: default_parallel_threshold(),
            layers: vec![],
        }
    }
}

/// One interaction network layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default = "default_layer_weight")]
    pub weight: f64,
}

fn default_layer_weight() -> f64 { 1.0 }

impl LayerConfig {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

// ── Seeds ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// How many top-scoring disease genes join the target as seeds
    #[serde(default = "default_top_disease_genes")]
    pub top_disease_genes: usize,
}

fn default_top_disease_genes() -> usize { 10 }

impl Default for SeedConfig {
    fn default() -> Self {
        Self { top_disease_genes: default_top_disease_genes() }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Ranked table destination; stdout when unset or "-"
    pub path: Option<PathBuf>,

    /// Optional JSON run summary
    pub summary: Option<PathBuf>,
}

impl OutputConfig {
    /// `None` means stdout.
    pub fn table_path(&self) -> Option<&PathBuf> {
        self.path.as_ref().filter(|p| p.as_os_str() != "-")
    }
}
