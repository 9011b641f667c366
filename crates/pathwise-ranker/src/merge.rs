//! Merge selectivity and propagation scores into one ranked table.
//!
//! Full outer join on gene symbol. Ordering:
//! 1. genes with a propagation score, by propagation score descending
//! 2. genes with only a selectivity score, by selectivity descending
//! 3. ties: selectivity present before absent, then higher selectivity,
//!    then gene symbol ascending

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use pathwise_common::{GeneSymbol, ScoreRecord};

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn compare(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.propagation_score
        .is_some()
        .cmp(&a.propagation_score.is_some())
        .then_with(|| match (a.governing_score(), b.governing_score()) {
            (Some(x), Some(y)) => desc(x, y),
            _ => Ordering::Equal,
        })
        .then_with(|| b.selectivity_score.is_some().cmp(&a.selectivity_score.is_some()))
        .then_with(|| match (a.selectivity_score, b.selectivity_score) {
            (Some(x), Some(y)) => desc(x, y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.gene.cmp(&b.gene))
}

/// Join the two score maps and assign 1-based ranks.
///
/// Output length equals the number of distinct genes across both inputs.
pub fn merge(
    selectivity: &BTreeMap<GeneSymbol, f64>,
    propagation: &BTreeMap<GeneSymbol, f64>,
) -> Vec<ScoreRecord> {
    let genes: BTreeSet<&GeneSymbol> = selectivity.keys().chain(propagation.keys()).collect();

    let mut records: Vec<ScoreRecord> = genes
        .into_iter()
        .map(|gene| ScoreRecord {
            gene: gene.clone(),
            selectivity_score: selectivity.get(gene).copied(),
            propagation_score: propagation.get(gene).copied(),
            rank: 0,
        })
        .collect();

    records.sort_by(compare);
    for (i, rec) in records.iter_mut().enumerate() {
        rec.rank = i + 1;
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<GeneSymbol, f64> {
        pairs.iter().map(|&(g, s)| (g.to_string(), s)).collect()
    }

    fn order(records: &[ScoreRecord]) -> Vec<&str> {
        records.iter().map(|r| r.gene.as_str()).collect()
    }

    #[test]
    fn test_outer_join_keeps_every_gene() {
        let sel = map(&[("A", 0.5), ("B", 0.25)]);
        let prop = map(&[("B", 0.6), ("C", 0.4)]);
        let records = merge(&sel, &prop);

        assert_eq!(records.len(), 3);
        let a = records.iter().find(|r| r.gene == "A").unwrap();
        assert_eq!(a.propagation_score, None);
        let c = records.iter().find(|r| r.gene == "C").unwrap();
        assert_eq!(c.selectivity_score, None);
    }

    #[test]
    fn test_propagated_genes_rank_first() {
        let sel = map(&[("A", 0.9), ("B", 0.1)]);
        let prop = map(&[("B", 0.01), ("C", 0.2)]);
        let records = merge(&sel, &prop);
        assert_eq!(order(&records), vec!["C", "B", "A"]);
        assert_eq!(records.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_break_on_selectivity_then_symbol() {
        let sel = map(&[("B", 0.5), ("D", 0.5), ("C", 0.75)]);
        let prop = map(&[("A", 0.25), ("B", 0.25), ("C", 0.25), ("D", 0.25)]);
        let records = merge(&sel, &prop);
        assert_eq!(order(&records), vec!["C", "B", "D", "A"]);
    }

    #[test]
    fn test_selectivity_only_ordering() {
        let sel = map(&[("A", 0.25), ("B", 0.5), ("C", 0.5), ("D", 0.25)]);
        let records = merge(&sel, &BTreeMap::new());
        assert_eq!(order(&records), vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(&BTreeMap::new(), &BTreeMap::new()).is_empty());
    }
}
