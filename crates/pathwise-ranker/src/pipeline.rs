//! End-to-end run: load inputs, score selectivity, propagate, merge, write.
//!
//! Loading and writing happen here; the scorer and propagator only see
//! in-memory structures built once per run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use pathwise_common::{
    GeneSymbol, MappingFormat, PathwayId, PathwiseError, PipelineConfig, Result, ScoreRecord,
};
use pathwise_network::interactions::load_interactions;
use pathwise_network::{InteractionGraph, Multiplex, PropagationLayer, RwrParams};
use pathwise_pathways::{
    gmt, reactome, score_selectivity, DiseasePathwaySource, GseaResultsFile, PathwayIndex,
    PathwayListFile,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::merge::merge;
use crate::output;
use crate::seeds::{load_disease_genes, select_seeds, DiseaseGeneScore};

/// Everything a run needs, already parsed.
pub struct PipelineInputs {
    pub target: GeneSymbol,
    pub index: PathwayIndex,
    pub disease_pathways: BTreeSet<PathwayId>,
    /// `None` when propagation is disabled or no layer is configured
    pub network: Option<Multiplex<InteractionGraph>>,
    pub disease_genes: Vec<DiseaseGeneScore>,
}

/// Counts and convergence details for one run, written as JSON on request.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub target: GeneSymbol,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub n_index_genes: usize,
    pub n_index_pathways: usize,
    pub n_disease_pathways: usize,
    pub n_target_pathways: usize,
    pub n_shared_pathways: usize,
    pub n_selectivity_genes: usize,
    /// Distinct genes across all network layers
    pub n_network_nodes: usize,
    /// Edges summed over layers; an edge present in two layers counts twice
    pub n_layer_edges: usize,
    pub seeds_used: Vec<GeneSymbol>,
    pub seeds_missing: Vec<GeneSymbol>,
    pub iterations: Option<usize>,
    pub converged: Option<bool>,
    pub residual: Option<f64>,
    pub n_records: usize,
}

impl RunSummary {
    fn new(target: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            target: target.to_string(),
            started_at,
            finished_at: started_at,
            n_index_genes: 0,
            n_index_pathways: 0,
            n_disease_pathways: 0,
            n_target_pathways: 0,
            n_shared_pathways: 0,
            n_selectivity_genes: 0,
            n_network_nodes: 0,
            n_layer_edges: 0,
            seeds_used: vec![],
            seeds_missing: vec![],
            iterations: None,
            converged: None,
            residual: None,
            n_records: 0,
        }
    }
}

pub struct PipelineOutcome {
    pub records: Vec<ScoreRecord>,
    pub summary: RunSummary,
}

fn required<'a>(value: Option<&'a Path>, key: &str) -> Result<&'a Path> {
    value.ok_or_else(|| PathwiseError::InvalidConfig(format!("{key} is not set")))
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Read every input file named by `config`.
pub fn load_inputs(config: &PipelineConfig) -> Result<PipelineInputs> {
    let inputs = &config.inputs;
    let target = inputs
        .target
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PathwiseError::InvalidConfig("inputs.target is not set".to_string()))?
        .to_string();

    let mapping = required(inputs.pathway_mapping.as_deref(), "inputs.pathway_mapping")?;
    let rows = match inputs.mapping_format {
        MappingFormat::Reactome => reactome::load_mapping(mapping, &inputs.species)?,
        MappingFormat::Gmt => gmt::load_gmt(mapping)?,
    };
    let index = PathwayIndex::build(rows);

    let source: Box<dyn DiseasePathwaySource> = match (&inputs.disease_pathways, &inputs.gsea_results) {
        (Some(list), _) => {
            if inputs.gsea_results.is_some() {
                warn!("Both disease_pathways and gsea_results set; using disease_pathways");
            }
            Box::new(PathwayListFile::new(list))
        }
        (None, Some(gsea)) => Box::new(GseaResultsFile {
            path: gsea.clone(),
            filter: config.enrichment.clone(),
        }),
        (None, None) => {
            return Err(PathwiseError::InvalidConfig(
                "one of inputs.disease_pathways or inputs.gsea_results must be set".to_string(),
            ))
        }
    };
    let disease_pathways = source.disease_pathways()?;

    let network = if config.propagation.enabled && !config.propagation.layers.is_empty() {
        let mut multiplex = Multiplex::new();
        for layer in &config.propagation.layers {
            let rows = load_interactions(&layer.path)?;
            let (graph, report) = InteractionGraph::build_with_report(rows);
            let name = layer.display_name();
            info!(
                layer = %name,
                weight = layer.weight,
                self_loops = report.self_loops,
                rejected = report.rejected_weights.count,
                "Loaded interaction layer"
            );
            multiplex.push(&name, graph, layer.weight);
        }
        Some(multiplex)
    } else {
        None
    };

    let disease_genes = match &inputs.disease_genes {
        Some(path) => load_disease_genes(path)?,
        None => vec![],
    };

    Ok(PipelineInputs { target, index, disease_pathways, network, disease_genes })
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Score and rank every gene for the target in `inputs`.
///
/// A target with no pathway in the index yields an empty table. Propagation
/// runs only when a network is present; an empty seed set is fatal.
pub fn run(inputs: &PipelineInputs, config: &PipelineConfig) -> Result<PipelineOutcome> {
    let mut summary = RunSummary::new(&inputs.target, Utc::now());
    summary.n_index_genes = inputs.index.gene_count();
    summary.n_index_pathways = inputs.index.pathway_count();
    summary.n_disease_pathways = inputs.disease_pathways.len();

    let target_pathways = inputs.index.pathways_of(&inputs.target);
    if target_pathways.is_empty() {
        warn!(target = %inputs.target, "Target gene has no pathway in the mapping; nothing to rank");
        summary.finished_at = Utc::now();
        return Ok(PipelineOutcome { records: vec![], summary });
    }
    summary.n_target_pathways = target_pathways.len();
    summary.n_shared_pathways = inputs.disease_pathways.intersection(target_pathways).count();

    let selectivity: BTreeMap<GeneSymbol, f64> = score_selectivity(
        &inputs.disease_pathways,
        target_pathways,
        &inputs.index,
        config.selectivity.universe,
    )
    .into_iter()
    .map(|(gene, s)| (gene, s.score))
    .collect();
    summary.n_selectivity_genes = selectivity.len();

    let mut propagation: BTreeMap<GeneSymbol, f64> = BTreeMap::new();
    if let Some(network) = &inputs.network {
        let mut nodes: BTreeSet<&str> = BTreeSet::new();
        for (_, layer) in network.layers() {
            nodes.extend(layer.node_names().iter().map(String::as_str));
            summary.n_layer_edges += layer.edge_count();
        }
        summary.n_network_nodes = nodes.len();
        let seeds = select_seeds(&inputs.target, &inputs.disease_genes, config.seeds.top_disease_genes);
        let params = RwrParams::from(&config.propagation);
        let result = network.propagate(&seeds, &params)?;

        summary.seeds_used = result.seeds_used.clone();
        summary.seeds_missing = result.seeds_missing.clone();
        summary.iterations = Some(result.iterations);
        summary.converged = Some(result.converged);
        summary.residual = Some(result.residual);
        propagation = result.scores;
    }

    let records = merge(&selectivity, &propagation);
    summary.n_records = records.len();
    summary.finished_at = Utc::now();
    info!(
        target = %inputs.target,
        n_records = records.len(),
        propagated = inputs.network.is_some(),
        "Ranked candidate genes"
    );
    Ok(PipelineOutcome { records, summary })
}

/// Load, run and write the table (and summary, if configured).
pub fn run_from_config(config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    let inputs = load_inputs(config)?;
    let outcome = run(&inputs, config)?;

    output::write_table_to(&outcome.records, config.output.table_path().map(|p| p.as_path()))?;
    if let Some(path) = &config.output.summary {
        output::write_summary(&outcome.summary, path)?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwise_network::InteractionRow;
    use pathwise_pathways::MembershipRow;

    fn scenario_index() -> PathwayIndex {
        PathwayIndex::build(vec![
            MembershipRow::new("A", "P1", "One"),
            MembershipRow::new("B", "P1", "One"),
            MembershipRow::new("B", "P2", "Two"),
            MembershipRow::new("C", "P2", "Two"),
            MembershipRow::new("C", "P3", "Three"),
            MembershipRow::new("D", "P3", "Three"),
        ])
    }

    fn inputs(target: &str, network: Option<Multiplex<InteractionGraph>>) -> PipelineInputs {
        PipelineInputs {
            target: target.to_string(),
            index: scenario_index(),
            disease_pathways: ["P1", "P2"].iter().map(|s| s.to_string()).collect(),
            network,
            disease_genes: vec![],
        }
    }

    #[test]
    fn test_selectivity_only_run() {
        // C sits on P2 and P3, so T = {P2, P3}
        let outcome = run(&inputs("C", None), &PipelineConfig::default()).unwrap();
        let order: Vec<&str> = outcome.records.iter().map(|r| r.gene.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A", "D"]);
        assert_eq!(outcome.records[0].selectivity_score, Some(0.5));
        assert_eq!(outcome.records[2].selectivity_score, Some(0.25));
        assert!(outcome.records.iter().all(|r| r.propagation_score.is_none()));
        assert_eq!(outcome.summary.n_shared_pathways, 1);
        assert_eq!(outcome.summary.converged, None);
    }

    #[test]
    fn test_unmapped_target_yields_empty_table() {
        let outcome = run(&inputs("ZZZ", None), &PipelineConfig::default()).unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.summary.n_target_pathways, 0);
    }

    #[test]
    fn test_propagated_genes_lead_the_table() {
        let graph = InteractionGraph::build(vec![
            InteractionRow::new("C", "X", None),
            InteractionRow::new("X", "Y", None),
        ]);
        let network = Multiplex::new().with_layer("fi", graph, 1.0);
        let outcome = run(&inputs("C", Some(network)), &PipelineConfig::default()).unwrap();

        // union of A..D and C, X, Y
        assert_eq!(outcome.records.len(), 6);
        assert_eq!(outcome.records[0].gene, "C");
        let propagated: Vec<&str> = outcome
            .records
            .iter()
            .take_while(|r| r.propagation_score.is_some())
            .map(|r| r.gene.as_str())
            .collect();
        assert_eq!(propagated, vec!["C", "X", "Y"]);
        assert_eq!(outcome.summary.seeds_used, vec!["C".to_string()]);
        assert_eq!(outcome.summary.converged, Some(true));
    }

    #[test]
    fn test_summary_counts_shared_nodes_once() {
        let fi = InteractionGraph::build(vec![
            InteractionRow::new("C", "X", None),
            InteractionRow::new("X", "Y", None),
        ]);
        let ppi = InteractionGraph::build(vec![InteractionRow::new("C", "X", None)]);
        let network = Multiplex::new().with_layer("fi", fi, 1.0).with_layer("ppi", ppi, 1.0);
        let outcome = run(&inputs("C", Some(network)), &PipelineConfig::default()).unwrap();
        assert_eq!(outcome.summary.n_network_nodes, 3);
        assert_eq!(outcome.summary.n_layer_edges, 3);
    }

    #[test]
    fn test_target_outside_network_is_fatal() {
        let graph = InteractionGraph::build(vec![InteractionRow::new("X", "Y", None)]);
        let network = Multiplex::new().with_layer("fi", graph, 1.0);
        let err = run(&inputs("C", Some(network)), &PipelineConfig::default()).err();
        assert!(matches!(err, Some(PathwiseError::EmptySeedSet { .. })));
    }

    #[test]
    fn test_missing_mapping_is_config_error() {
        let mut config = PipelineConfig::default();
        config.inputs.target = Some("BTG4".to_string());
        assert!(matches!(load_inputs(&config), Err(PathwiseError::InvalidConfig(_))));
    }
}
