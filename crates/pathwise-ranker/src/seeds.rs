//! Seed selection for network propagation.
//!
//! Seeds are the target gene plus the `n` highest-scoring disease genes
//! from the disease association table (`symbol`, `globalScore`), the same
//! table the upstream enrichment step ranks.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use pathwise_common::{tsv, GeneSymbol, Result, SkippedRows};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseGeneScore {
    pub symbol: GeneSymbol,
    pub global_score: f64,
}

impl DiseaseGeneScore {
    pub fn new(symbol: &str, global_score: f64) -> Self {
        Self { symbol: symbol.to_string(), global_score }
    }
}

/// Load a disease gene table. Rows with a missing symbol or a non-numeric
/// score are skipped; a symbol listed twice keeps its best score.
pub fn load_disease_genes(path: &Path) -> Result<Vec<DiseaseGeneScore>> {
    let mut reader = tsv::open(path, true)?;
    let headers = reader.headers()?.clone();
    let symbol_idx = tsv::column(&headers, "symbol", path)?;
    let score_idx = tsv::column(&headers, "globalScore", path)?;

    let mut best: HashMap<GeneSymbol, f64> = HashMap::new();
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
        let symbol = record.get(symbol_idx).unwrap_or("").trim();
        let score = record
            .get(score_idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite());
        match (symbol, score) {
            ("", _) | (_, None) => skipped.record(tsv::line_of(&record), "missing symbol or score"),
            (symbol, Some(score)) => {
                let slot = best.entry(symbol.to_string()).or_insert(score);
                if score > *slot {
                    *slot = score;
                }
            }
        }
    }

    skipped.report(&path.display().to_string());
    let mut genes: Vec<DiseaseGeneScore> = best
        .into_iter()
        .map(|(symbol, global_score)| DiseaseGeneScore { symbol, global_score })
        .collect();
    genes.sort_by(by_score);

    info!(file = %path.display(), n_genes = genes.len(), "Loaded disease gene scores");
    Ok(genes)
}

/// Descending score, ties by symbol.
fn by_score(a: &DiseaseGeneScore, b: &DiseaseGeneScore) -> Ordering {
    b.global_score
        .partial_cmp(&a.global_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Target plus up to `top_n` distinct disease genes other than the target.
pub fn select_seeds(target: &str, disease_genes: &[DiseaseGeneScore], top_n: usize) -> BTreeSet<GeneSymbol> {
    let mut ranked: Vec<&DiseaseGeneScore> = disease_genes.iter().collect();
    ranked.sort_by(|a, b| by_score(a, b));

    let mut seeds: BTreeSet<GeneSymbol> = BTreeSet::new();
    let target = target.trim();
    if !target.is_empty() {
        seeds.insert(target.to_string());
    }

    let mut added = 0;
    for gene in ranked {
        if added == top_n {
            break;
        }
        if gene.symbol == target || seeds.contains(&gene.symbol) {
            continue;
        }
        seeds.insert(gene.symbol.clone());
        added += 1;
    }

    info!(target, n_seeds = seeds.len(), top_n, "Selected propagation seeds");
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn seeds_vec(seeds: &BTreeSet<GeneSymbol>) -> Vec<&str> {
        seeds.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_select_top_genes_plus_target() {
        let genes = vec![
            DiseaseGeneScore::new("TP53", 0.9),
            DiseaseGeneScore::new("BTG4", 0.95),
            DiseaseGeneScore::new("MYC", 0.8),
            DiseaseGeneScore::new("KRAS", 0.8),
            DiseaseGeneScore::new("EGFR", 0.1),
        ];
        let seeds = select_seeds("BTG4", &genes, 3);
        // BTG4 is the target so it does not use a slot; KRAS beats MYC on symbol
        assert_eq!(seeds_vec(&seeds), vec!["BTG4", "KRAS", "MYC", "TP53"]);
    }

    #[test]
    fn test_zero_top_genes_is_target_only() {
        let genes = vec![DiseaseGeneScore::new("TP53", 0.9)];
        assert_eq!(seeds_vec(&select_seeds("BTG4", &genes, 0)), vec!["BTG4"]);
        assert_eq!(seeds_vec(&select_seeds("BTG4", &[], 5)), vec!["BTG4"]);
    }

    #[test]
    fn test_load_disease_genes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "symbol\tglobalScore\n\
             TP53\t0.7\n\
             MYC\tnot-a-number\n\
             TP53\t0.9\n\
             \t0.5\n\
             KRAS\t0.8\n"
        )
        .unwrap();

        let genes = load_disease_genes(file.path()).unwrap();
        assert_eq!(
            genes,
            vec![DiseaseGeneScore::new("TP53", 0.9), DiseaseGeneScore::new("KRAS", 0.8)]
        );
    }

    #[test]
    fn test_undecodable_row_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"symbol\tglobalScore\nTP53\t0.7\n\xff\xfe\t0.5\nKRAS\t0.8\n")
            .unwrap();
        let genes = load_disease_genes(file.path()).unwrap();
        assert_eq!(
            genes,
            vec![DiseaseGeneScore::new("KRAS", 0.8), DiseaseGeneScore::new("TP53", 0.7)]
        );
    }

    #[test]
    fn test_missing_score_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "symbol\tscore\nTP53\t0.7\n").unwrap();
        assert!(load_disease_genes(file.path()).is_err());
    }
}
