//! Bidirectional gene ↔ pathway membership index.
//!
//! Structure:
//! - `gene_pathways`: gene symbol -> set of pathway IDs
//! - `pathway_genes`: pathway ID -> set of gene symbols (reverse index)
//! - `pathway_names`: pathway ID -> human-readable name
//!
//! Sets are ordered so every iteration over the index is deterministic.

use std::collections::{BTreeSet, HashMap};

use pathwise_common::{GeneSymbol, PathwayId, SkippedRows};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One (gene, pathway) membership as read from a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub gene: GeneSymbol,
    pub pathway_id: PathwayId,
    pub pathway_name: String,
}

impl MembershipRow {
    pub fn new(gene: &str, pathway_id: &str, pathway_name: &str) -> Self {
        Self {
            gene: gene.to_string(),
            pathway_id: pathway_id.to_string(),
            pathway_name: pathway_name.to_string(),
        }
    }
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// Read-only membership index, built once per run.
#[derive(Debug, Clone, Default)]
pub struct PathwayIndex {
    gene_pathways: HashMap<GeneSymbol, BTreeSet<PathwayId>>,
    pathway_genes: HashMap<PathwayId, BTreeSet<GeneSymbol>>,
    pathway_names: HashMap<PathwayId, String>,
    skipped: SkippedRows,
}

impl PathwayIndex {
    /// Build the index from mapping rows.
    ///
    /// Rows with an empty gene symbol or pathway ID are skipped and counted.
    /// The first non-empty name seen for a pathway is kept. Repeated rows
    /// (the same symbol reached from several Ensembl IDs) collapse.
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = MembershipRow>,
    {
        let mut index = Self::default();

        for (i, row) in rows.into_iter().enumerate() {
            let gene = row.gene.trim();
            let pathway = row.pathway_id.trim();
            if gene.is_empty() || pathway.is_empty() {
                index.skipped.record(i + 1, "empty gene or pathway id");
                continue;
            }

            index
                .gene_pathways
                .entry(gene.to_string())
                .or_default()
                .insert(pathway.to_string());
            index
                .pathway_genes
                .entry(pathway.to_string())
                .or_default()
                .insert(gene.to_string());

            let name = row.pathway_name.trim();
            if !name.is_empty() {
                index
                    .pathway_names
                    .entry(pathway.to_string())
                    .or_insert_with(|| name.to_string());
            }
        }

        index.skipped.report("pathway membership rows");
        info!(
            n_genes = index.gene_count(),
            n_pathways = index.pathway_count(),
            "Built pathway membership index"
        );
        index
    }

    /// Pathways containing `gene`; empty for an unknown gene.
    pub fn pathways_of(&self, gene: &str) -> &BTreeSet<PathwayId> {
        self.gene_pathways.get(gene).unwrap_or(&EMPTY)
    }

    /// Member genes of `pathway_id`; empty for an unknown pathway.
    pub fn genes_of(&self, pathway_id: &str) -> &BTreeSet<GeneSymbol> {
        self.pathway_genes.get(pathway_id).unwrap_or(&EMPTY)
    }

    pub fn pathway_name(&self, pathway_id: &str) -> Option<&str> {
        self.pathway_names.get(pathway_id).map(|s| s.as_str())
    }

    pub fn has_gene(&self, gene: &str) -> bool {
        self.gene_pathways.contains_key(gene)
    }

    pub fn has_pathway(&self, pathway_id: &str) -> bool {
        self.pathway_genes.contains_key(pathway_id)
    }

    pub fn gene_count(&self) -> usize {
        self.gene_pathways.len()
    }

    pub fn pathway_count(&self) -> usize {
        self.pathway_genes.len()
    }

    /// Rows dropped while building.
    pub fn skipped(&self) -> &SkippedRows {
        &self.skipped
    }
}
