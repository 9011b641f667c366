//! Undirected weighted gene–gene interaction graph.
//!
//! Nodes are interned in lexicographic symbol order, so node indices (and
//! therefore every floating-point summation order downstream) depend only on
//! the input's content, not on row order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pathwise_common::{GeneSymbol, SkippedRows};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One row of an interaction table. `weight: None` means unweighted (1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRow {
    pub gene_a: GeneSymbol,
    pub gene_b: GeneSymbol,
    pub weight: Option<f64>,
}

impl InteractionRow {
    pub fn new(gene_a: &str, gene_b: &str, weight: Option<f64>) -> Self {
        Self {
            gene_a: gene_a.to_string(),
            gene_b: gene_b.to_string(),
            weight,
        }
    }
}

/// What the builder dropped or merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphBuildReport {
    pub self_loops: usize,
    pub duplicate_edges: usize,
    /// Rows with a negative or non-finite weight, by row ordinal
    pub rejected_weights: SkippedRows,
    /// Rows with an empty gene symbol, by row ordinal
    pub empty_symbols: SkippedRows,
}

/// A graph the random walk can run on.
///
/// A layer exposes its nodes and one step of the walk: `out[j] = Σᵢ p[i]·W[i][j]`
/// with `W` row-stochastic. Multiplex walks combine several layers through
/// this trait, so a single graph satisfies the same contract.
pub trait PropagationLayer: Sync {
    fn node_names(&self) -> &[GeneSymbol];

    fn node_index(&self, gene: &str) -> Option<usize>;

    /// Apply `Wᵀ` to `p`, writing into `out`. Both slices have one entry per node.
    fn spread(&self, p: &[f64], out: &mut [f64], parallel: bool);

    fn node_count(&self) -> usize {
        self.node_names().len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    names: Vec<GeneSymbol>,
    ids: HashMap<GeneSymbol, usize>,
    /// Neighbours of each node, sorted by node index
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Weighted degree of each node
    degree: Vec<f64>,
    n_edges: usize,
}

impl InteractionGraph {
    /// Build a graph, discarding the build report.
    pub fn build<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = InteractionRow>,
    {
        Self::build_with_report(rows).0
    }

    /// Build a graph from interaction rows.
    ///
    /// - self-pairs are dropped
    /// - a missing weight is 1.0
    /// - negative or NaN weights reject that edge only
    /// - duplicate pairs keep the maximum weight, in either orientation
    pub fn build_with_report<I>(rows: I) -> (Self, GraphBuildReport)
    where
        I: IntoIterator<Item = InteractionRow>,
    {
        let mut report = GraphBuildReport::default();
        let mut nodes: BTreeSet<GeneSymbol> = BTreeSet::new();
        let mut edges: BTreeMap<(GeneSymbol, GeneSymbol), f64> = BTreeMap::new();

        for (i, row) in rows.into_iter().enumerate() {
            let ordinal = i + 1;
            let a = row.gene_a.trim();
            let b = row.gene_b.trim();
            if a.is_empty() || b.is_empty() {
                report.empty_symbols.record(ordinal, "empty gene symbol");
                continue;
            }
            nodes.insert(a.to_string());
            nodes.insert(b.to_string());

            if a == b {
                report.self_loops += 1;
                continue;
            }

            let weight = row.weight.unwrap_or(1.0);
            if !weight.is_finite() || weight < 0.0 {
                report.rejected_weights.record(ordinal, "negative or non-finite weight");
                continue;
            }

            let key = if a < b {
                (a.to_string(), b.to_string())
            } else {
                (b.to_string(), a.to_string())
            };
            match edges.get_mut(&key) {
                Some(existing) => {
                    report.duplicate_edges += 1;
                    if weight > *existing {
                        *existing = weight;
                    }
                }
                None => {
                    edges.insert(key, weight);
                }
            }
        }

        let names: Vec<GeneSymbol> = nodes.into_iter().collect();
        let ids: HashMap<GeneSymbol, usize> =
            names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); names.len()];
        for ((a, b), w) in &edges {
            let (ia, ib) = (ids[a], ids[b]);
            adjacency[ia].push((ib, *w));
            adjacency[ib].push((ia, *w));
        }
        for neighbours in &mut adjacency {
            neighbours.sort_by_key(|&(j, _)| j);
        }
        let degree: Vec<f64> = adjacency
            .iter()
            .map(|ns| ns.iter().map(|&(_, w)| w).sum())
            .collect();

        report.empty_symbols.report("interaction rows");
        report.rejected_weights.report("interaction weights");
        let graph = Self {
            names,
            ids,
            adjacency,
            degree,
            n_edges: edges.len(),
        };
        info!(
            n_nodes = graph.node_count(),
            n_edges = graph.edge_count(),
            self_loops = report.self_loops,
            duplicate_edges = report.duplicate_edges,
            rejected = report.rejected_weights.count,
            "Built functional interaction network"
        );
        (graph, report)
    }

    pub fn edge_count(&self) -> usize {
        self.n_edges
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.ids.contains_key(gene)
    }

    /// Neighbours of `gene` with edge weights; empty for an unknown gene.
    pub fn neighbors<'a>(&'a self, gene: &str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let slice: &[(usize, f64)] = match self.ids.get(gene) {
            Some(&i) => &self.adjacency[i],
            None => &[],
        };
        slice.iter().map(move |&(j, w)| (self.names[j].as_str(), w))
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let (ia, ib) = (*self.ids.get(a)?, *self.ids.get(b)?);
        self.adjacency[ia]
            .binary_search_by_key(&ib, |&(j, _)| j)
            .ok()
            .map(|pos| self.adjacency[ia][pos].1)
    }

    /// Sum of edge weights at `gene`.
    pub fn weighted_degree(&self, gene: &str) -> Option<f64> {
        self.ids.get(gene).map(|&i| self.degree[i])
    }

    /// Row-normalised transition probability `W[a][b] = w(a,b) / deg(a)`.
    /// Zero for isolated nodes and non-adjacent pairs.
    pub fn transition_probability(&self, a: &str, b: &str) -> f64 {
        match (self.edge_weight(a, b), self.weighted_degree(a)) {
            (Some(w), Some(d)) if d > 0.0 => w / d,
            _ => 0.0,
        }
    }

    fn pull(&self, j: usize, p: &[f64]) -> f64 {
        self.adjacency[j]
            .iter()
            .filter(|&&(i, _)| self.degree[i] > 0.0)
            .map(|&(i, w)| p[i] * w / self.degree[i])
            .sum()
    }
}

impl PropagationLayer for InteractionGraph {
    fn node_names(&self) -> &[GeneSymbol] {
        &self.names
    }

    fn node_index(&self, gene: &str) -> Option<usize> {
        self.ids.get(gene).copied()
    }

    /// Pull formulation: each node sums over its own neighbour list, so the
    /// sequential and rayon paths produce bit-identical vectors.
    fn spread(&self, p: &[f64], out: &mut [f64], parallel: bool) {
        if parallel {
            out.par_iter_mut()
                .enumerate()
                .for_each(|(j, slot)| *slot = self.pull(j, p));
        } else {
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = self.pull(j, p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(a: &str, b: &str, w: Option<f64>) -> InteractionRow {
        InteractionRow::new(a, b, w)
    }

    #[test]
    fn test_build_drops_self_loops_and_defaults_weight() {
        let (graph, report) = InteractionGraph::build_with_report(vec![
            row("X", "Y", None),
            row("Y", "Y", Some(3.0)),
        ]);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(report.self_loops, 1);
        assert_eq!(graph.edge_weight("X", "Y"), Some(1.0));
        assert_eq!(graph.edge_weight("Y", "X"), Some(1.0));
        assert_eq!(graph.edge_weight("Y", "Y"), None);
    }

    #[test]
    fn test_duplicate_edges_keep_max_weight() {
        let forward = InteractionGraph::build(vec![
            row("A", "B", Some(0.3)),
            row("B", "A", Some(0.9)),
            row("A", "B", Some(0.5)),
        ]);
        let reversed = InteractionGraph::build(vec![
            row("A", "B", Some(0.5)),
            row("B", "A", Some(0.9)),
            row("A", "B", Some(0.3)),
        ]);
        assert_eq!(forward.edge_weight("A", "B"), Some(0.9));
        assert_eq!(reversed.edge_weight("A", "B"), Some(0.9));
        assert_eq!(forward.edge_count(), 1);
    }

    #[test]
    fn test_invalid_weights_reject_only_that_edge() {
        let (graph, report) = InteractionGraph::build_with_report(vec![
            row("A", "B", Some(-1.0)),
            row("A", "C", Some(f64::NAN)),
            row("B", "C", Some(2.0)),
        ]);
        assert_eq!(report.rejected_weights.count, 2);
        assert_eq!(report.rejected_weights.sample_lines, vec![1, 2]);
        assert_eq!(graph.edge_count(), 1);
        // A stays a node, with no edges
        assert!(graph.contains("A"));
        assert_eq!(graph.weighted_degree("A"), Some(0.0));
    }

    #[test]
    fn test_transition_rows_are_stochastic() {
        let graph = InteractionGraph::build(vec![
            row("A", "B", Some(1.0)),
            row("A", "C", Some(3.0)),
            row("B", "C", None),
            row("D", "E", Some(0.0)),
        ]);
        assert!((graph.transition_probability("A", "C") - 0.75).abs() < 1e-12);
        for gene in ["A", "B", "C"] {
            let total: f64 = graph
                .node_names()
                .iter()
                .map(|other| graph.transition_probability(gene, other))
                .sum();
            assert!((total - 1.0).abs() < 1e-12, "{gene} row sums to {total}");
        }
        // zero-weight edge leaves D with no outgoing mass
        assert_eq!(graph.transition_probability("D", "E"), 0.0);
    }

    #[test]
    fn test_neighbors_and_unknown_gene() {
        let graph = InteractionGraph::build(vec![row("A", "B", Some(2.0)), row("A", "C", None)]);
        let ns: Vec<(&str, f64)> = graph.neighbors("A").collect();
        assert_eq!(ns, vec![("B", 2.0), ("C", 1.0)]);
        assert_eq!(graph.neighbors("Z").count(), 0);
        assert_eq!(graph.weighted_degree("Z"), None);
    }

    #[test]
    fn test_parallel_spread_matches_sequential() {
        let rows: Vec<InteractionRow> = (0..200)
            .map(|i| row(&format!("G{i}"), &format!("G{}", (i * 7 + 3) % 200), Some(1.0 + (i % 5) as f64)))
            .collect();
        let graph = InteractionGraph::build(rows);
        let n = graph.node_count();
        let p: Vec<f64> = (0..n).map(|i| (i as f64 + 1.0) / n as f64).collect();

        let mut seq = vec![0.0; n];
        let mut par = vec![0.0; n];
        graph.spread(&p, &mut seq, false);
        graph.spread(&p, &mut par, true);
        assert_eq!(seq, par);
    }
}
