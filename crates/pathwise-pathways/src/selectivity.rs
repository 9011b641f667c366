//! Pathway selectivity score.
//!
//! For a gene g, a disease pathway set D and a target pathway set T:
//!
//!   memberships(g) = disease_hits(g) + target_hits(g) − shared_hits(g)
//!   S(g)           = memberships(g) / (|D| + |T|)
//!
//! where `shared_hits` counts pathways in D ∩ T containing g, so a pathway
//! listed in both sets is one membership. S(g) is 0 when |D| + |T| = 0.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use pathwise_common::{GeneSymbol, GeneUniverse, PathwayId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::index::PathwayIndex;

/// Per-gene selectivity result with the counters it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectivityScore {
    pub gene: GeneSymbol,
    /// Disease pathways containing the gene
    pub disease_pathway_hits: usize,
    /// Target pathways containing the gene
    pub target_pathway_hits: usize,
    /// Pathways in both sets containing the gene
    pub shared_pathway_hits: usize,
    pub score: f64,
}

impl SelectivityScore {
    fn new(gene: &str) -> Self {
        Self {
            gene: gene.to_string(),
            disease_pathway_hits: 0,
            target_pathway_hits: 0,
            shared_pathway_hits: 0,
            score: 0.0,
        }
    }

    pub fn memberships(&self) -> usize {
        self.disease_pathway_hits + self.target_pathway_hits - self.shared_pathway_hits
    }
}

/// Score every gene reachable through `disease_pathways` ∪ `target_pathways`.
///
/// An empty target set is valid: scores then come from disease hits alone.
/// Both sets empty yields an empty map. Pathway IDs unknown to the index
/// still count toward the denominator.
pub fn score_selectivity(
    disease_pathways: &BTreeSet<PathwayId>,
    target_pathways: &BTreeSet<PathwayId>,
    index: &PathwayIndex,
    universe: GeneUniverse,
) -> BTreeMap<GeneSymbol, SelectivityScore> {
    let mut scores: BTreeMap<GeneSymbol, SelectivityScore> = BTreeMap::new();

    let unknown = disease_pathways
        .iter()
        .chain(target_pathways.iter())
        .filter(|p| !index.has_pathway(p))
        .count();
    if unknown > 0 {
        warn!(unknown, "Pathway IDs not present in the membership index");
    }

    for pathway in disease_pathways {
        let shared = target_pathways.contains(pathway);
        for gene in index.genes_of(pathway) {
            let entry = scores
                .entry(gene.clone())
                .or_insert_with(|| SelectivityScore::new(gene));
            entry.disease_pathway_hits += 1;
            if shared {
                entry.shared_pathway_hits += 1;
            }
        }
    }

    for pathway in target_pathways {
        for gene in index.genes_of(pathway) {
            scores
                .entry(gene.clone())
                .or_insert_with(|| SelectivityScore::new(gene))
                .target_pathway_hits += 1;
        }
    }

    if universe == GeneUniverse::Intersection {
        scores.retain(|_, s| s.disease_pathway_hits > 0 && s.target_pathway_hits > 0);
    }

    let denominator = disease_pathways.len() + target_pathways.len();
    for s in scores.values_mut() {
        s.score = if denominator == 0 {
            0.0
        } else {
            s.memberships() as f64 / denominator as f64
        };
    }

    info!(
        n_disease_pathways = disease_pathways.len(),
        n_target_pathways = target_pathways.len(),
        n_genes = scores.len(),
        ?universe,
        "Computed pathway selectivity"
    );
    scores
}

/// Selectivity results in output order: score descending, then gene symbol.
pub fn rank_by_selectivity(scores: &BTreeMap<GeneSymbol, SelectivityScore>) -> Vec<&SelectivityScore> {
    let mut ranked: Vec<&SelectivityScore> = scores.values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.gene.cmp(&b.gene))
    });
    ranked
}
