//! Disease-enriched pathway sets.
//!
//! Enrichment itself is computed upstream (GSEA over the ranked
//! `symbol`/`globalScore` table). This module reads what that step leaves
//! behind, either a plain list of pathway IDs or the full result table,
//! and applies significance filters to the latter.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pathwise_common::{tsv, EnrichmentConfig, PathwayId, Result, SkippedRows};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Header written above a filtered pathway ID list.
pub const PATHWAY_LIST_HEADER: &str = "pathwayId";

/// Source of the disease pathway set.
///
/// Implementations can use:
/// - A pre-filtered list of IDs (local file)
/// - A GSEA result table plus significance thresholds
/// - Static data (testing, library callers)
pub trait DiseasePathwaySource {
    /// Deduplicated disease pathway IDs.
    fn disease_pathways(&self) -> Result<BTreeSet<PathwayId>>;
}

// ── Pathway ID list ─────────────────────────────────────────────────────────

/// One pathway ID per line, optionally headed by `pathwayId`.
#[derive(Debug, Clone)]
pub struct PathwayListFile {
    pub path: PathBuf,
}

impl PathwayListFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiseasePathwaySource for PathwayListFile {
    fn disease_pathways(&self) -> Result<BTreeSet<PathwayId>> {
        read_pathway_list(&self.path)
    }
}

pub fn read_pathway_list(path: &Path) -> Result<BTreeSet<PathwayId>> {
    let mut reader = tsv::open(path, false)?;
    let mut pathways = BTreeSet::new();
    let mut n_lines = 0usize;
    let mut skipped = SkippedRows::default();

    for (i, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) if !e.is_io_error() => {
                skipped.record(tsv::error_line(&e), "undecodable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let id = record.get(0).unwrap_or("").trim();
        if id.is_empty() || (i == 0 && id == PATHWAY_LIST_HEADER) {
            continue;
        }
        n_lines += 1;
        pathways.insert(id.to_string());
    }

    skipped.report(&path.display().to_string());
    info!(
        file = %path.display(),
        n_lines,
        n_pathways = pathways.len(),
        "Loaded disease pathway list"
    );
    Ok(pathways)
}

// ── GSEA result table ───────────────────────────────────────────────────────

/// One row of a GSEA result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GseaRecord {
    pub id: PathwayId,
    pub term: Option<String>,
    pub pval: Option<f64>,
    pub qval: Option<f64>,
    pub nes: Option<f64>,
}

/// GSEA result table filtered by an [`EnrichmentConfig`].
#[derive(Debug, Clone)]
pub struct GseaResultsFile {
    pub path: PathBuf,
    pub filter: EnrichmentConfig,
}

impl DiseasePathwaySource for GseaResultsFile {
    fn disease_pathways(&self) -> Result<BTreeSet<PathwayId>> {
        let mut records = read_gsea_results(&self.path)?;
        fill_missing_qvalues(&mut records);
        Ok(filter_enriched(&records, &self.filter))
    }
}

/// Read a GSEA result table. `ID` is required; `Term`, `pval`, `qval` and
/// `NES` are picked up when present. Non-numeric statistics read as missing.
pub fn read_gsea_results(path: &Path) -> Result<Vec<GseaRecord>> {
    let mut reader = tsv::open(path, true)?;
    let headers = reader.headers()?.clone();

    let id_idx = tsv::column(&headers, "ID", path)?;
    let optional = |name: &str| headers.iter().position(|h| h.trim() == name);
    let term_idx = optional("Term");
    let pval_idx = optional("pval");
    let qval_idx = optional("qval");
    let nes_idx = optional("NES");

    let number = |record: &csv::StringRecord, idx: Option<usize>| -> Option<f64> {
        idx.and_then(|i| record.get(i))
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    let mut records = Vec::new();
    let mut skipped = SkippedRows::default();
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if !e.is_io_error() => {
                skipped.record(tsv::error_line(&e), "undecodable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let id = record.get(id_idx).unwrap_or("").trim();
        if id.is_empty() {
            skipped.record(tsv::line_of(&record), "empty pathway ID");
            continue;
        }
        records.push(GseaRecord {
            id: id.to_string(),
            term: term_idx.and_then(|i| record.get(i)).map(|t| t.trim().to_string()),
            pval: number(&record, pval_idx),
            qval: number(&record, qval_idx),
            nes: number(&record, nes_idx),
        });
    }

    skipped.report(&path.display().to_string());
    info!(file = %path.display(), n_records = records.len(), "Loaded GSEA results");
    Ok(records)
}

/// Benjamini–Hochberg step-up adjusted p-values, returned in input order
/// and capped at 1.0.
pub fn benjamini_hochberg(pvals: &[f64]) -> Vec<f64> {
    let n = pvals.len();
    if n == 0 {
        return vec![];
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| pvals[a].partial_cmp(&pvals[b]).unwrap_or(Ordering::Equal));

    let mut qvals = vec![1.0f64; n];
    let mut running_min = f64::INFINITY;
    for (rank0, &i) in order.iter().enumerate().rev() {
        let raw = pvals[i] * n as f64 / (rank0 + 1) as f64;
        running_min = running_min.min(raw);
        qvals[i] = running_min.min(1.0);
    }
    qvals
}

/// Compute `qval` from `pval` when no record carries a q-value.
/// Records without a p-value get q = 1.0.
pub fn fill_missing_qvalues(records: &mut [GseaRecord]) {
    if records.iter().any(|r| r.qval.is_some()) {
        return;
    }
    let with_p: Vec<usize> = (0..records.len()).filter(|&i| records[i].pval.is_some()).collect();
    if with_p.is_empty() {
        return;
    }

    let pvals: Vec<f64> = with_p.iter().filter_map(|&i| records[i].pval).collect();
    let qvals = benjamini_hochberg(&pvals);
    for r in records.iter_mut() {
        r.qval = Some(1.0);
    }
    for (&i, q) in with_p.iter().zip(qvals) {
        records[i].qval = Some(q);
    }
}

/// Apply significance filters and return the surviving pathway IDs.
///
/// A threshold whose column is absent from every record is skipped with a
/// warning rather than rejecting everything.
pub fn filter_enriched(records: &[GseaRecord], filter: &EnrichmentConfig) -> BTreeSet<PathwayId> {
    let has_pval = records.iter().any(|r| r.pval.is_some());
    let has_qval = records.iter().any(|r| r.qval.is_some());
    let has_nes = records.iter().any(|r| r.nes.is_some());

    let pval_threshold = filter.pval_threshold.filter(|_| {
        if !has_pval {
            warn!("GSEA results have no pval column; skipping p-value filter");
        }
        has_pval
    });
    let fdr_threshold = filter.fdr_threshold.filter(|_| {
        if !has_qval {
            warn!("GSEA results have no qval column; skipping FDR filter");
        }
        has_qval
    });
    let nes_positive = filter.nes_positive && has_nes;

    let kept: BTreeSet<PathwayId> = records
        .iter()
        .filter(|r| pval_threshold.map_or(true, |t| r.pval.is_some_and(|p| p <= t)))
        .filter(|r| fdr_threshold.map_or(true, |t| r.qval.is_some_and(|q| q <= t)))
        .filter(|r| !nes_positive || r.nes.is_some_and(|n| n > 0.0))
        .map(|r| r.id.clone())
        .collect();

    info!(
        n_records = records.len(),
        n_enriched = kept.len(),
        ?pval_threshold,
        ?fdr_threshold,
        nes_positive,
        "Filtered enriched pathways"
    );
    kept
}

// ── Static source ───────────────────────────────────────────────────────────

/// In-memory pathway set.
#[derive(Debug, Clone, Default)]
pub struct StaticPathways {
    pathways: BTreeSet<PathwayId>,
}

impl StaticPathways {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pathway: &str) -> Self {
        self.pathways.insert(pathway.to_string());
        self
    }
}

impl DiseasePathwaySource for StaticPathways {
    fn disease_pathways(&self) -> Result<BTreeSet<PathwayId>> {
        Ok(self.pathways.clone())
    }
}
