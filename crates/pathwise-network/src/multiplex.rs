//! Multiplex propagation over several interaction layers.
//!
//! Each layer is walked independently from the same seeds; per-gene scores
//! are combined as Σₗ wₗ·scoreₗ(g) with layer weights renormalised over the
//! layers that actually contain a seed, then rescaled to sum to 1. A gene
//! absent from every layer has no score.

use std::collections::{BTreeMap, BTreeSet};

use pathwise_common::{GeneSymbol, PathwiseError, Result};
use tracing::{info, warn};

use crate::graph::PropagationLayer;
use crate::propagate::{propagate, PropagationResult, RwrParams};
use crate::weights::LayerWeights;

/// Ordered collection of weighted layers.
pub struct Multiplex<L> {
    layers: Vec<(String, L)>,
    weights: LayerWeights,
}

impl<L: PropagationLayer> Default for Multiplex<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PropagationLayer> Multiplex<L> {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            weights: LayerWeights::new(),
        }
    }

    pub fn with_layer(mut self, name: &str, layer: L, weight: f64) -> Self {
        self.push(name, layer, weight);
        self
    }

    pub fn push(&mut self, name: &str, layer: L, weight: f64) {
        self.layers.push((name.to_string(), layer));
        self.weights.push(name, weight);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &L)> {
        self.layers.iter().map(|(n, l)| (n.as_str(), l))
    }

    /// Walk every layer and merge the scores.
    ///
    /// Layer weights must be finite and non-negative (`InvalidConfig`
    /// otherwise). A layer containing none of the seeds is skipped with a
    /// warning; the call only fails with `EmptySeedSet` when no layer
    /// contains a seed. With a single layer the result equals [`propagate`]
    /// on that layer.
    pub fn propagate(&self, seeds: &BTreeSet<GeneSymbol>, params: &RwrParams) -> Result<PropagationResult> {
        self.weights.validate()?;

        let mut contributing = LayerWeights::new();
        let mut runs: Vec<PropagationResult> = Vec::new();
        for ((name, layer), (_, weight)) in self.layers.iter().zip(self.weights.as_slice()) {
            if *weight == 0.0 {
                warn!(layer = %name, "Skipping zero-weight layer");
                continue;
            }
            match propagate(layer, seeds, params) {
                Ok(result) => {
                    contributing.push(name, *weight);
                    runs.push(result);
                }
                Err(PathwiseError::EmptySeedSet { .. }) => {
                    warn!(layer = %name, "No seed is a node of this layer; skipping it");
                }
                Err(e) => return Err(e),
            }
        }

        if runs.is_empty() {
            return Err(PathwiseError::EmptySeedSet {
                requested: seeds.iter().cloned().collect::<Vec<_>>().join(", "),
            });
        }
        if runs.len() == 1 {
            if let Some(only) = runs.pop() {
                return Ok(only);
            }
        }

        contributing.normalise()?;
        let mut scores: BTreeMap<GeneSymbol, f64> = BTreeMap::new();
        for ((_, weight), run) in contributing.as_slice().iter().zip(&runs) {
            for (gene, score) in &run.scores {
                *scores.entry(gene.clone()).or_insert(0.0) += weight * score;
            }
        }
        let total: f64 = scores.values().sum();
        if total > 0.0 {
            for v in scores.values_mut() {
                *v /= total;
            }
        }

        let seeds_used: BTreeSet<GeneSymbol> = runs
            .iter()
            .flat_map(|r| r.seeds_used.iter().cloned())
            .collect();
        let seeds_missing: Vec<GeneSymbol> = seeds
            .iter()
            .filter(|s| !seeds_used.contains(*s))
            .cloned()
            .collect();

        let result = PropagationResult {
            scores,
            seeds_used: seeds_used.into_iter().collect(),
            seeds_missing,
            iterations: runs.iter().map(|r| r.iterations).max().unwrap_or(0),
            converged: runs.iter().all(|r| r.converged),
            residual: runs.iter().map(|r| r.residual).fold(0.0, f64::max),
        };
        info!(
            n_layers = runs.len(),
            n_genes = result.scores.len(),
            converged = result.converged,
            "Merged multiplex propagation"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InteractionGraph, InteractionRow};

    fn graph(edges: &[(&str, &str)]) -> InteractionGraph {
        InteractionGraph::build(edges.iter().map(|&(a, b)| InteractionRow::new(a, b, None)))
    }

    fn seeds(genes: &[&str]) -> BTreeSet<GeneSymbol> {
        genes.iter().map(|s| s.to_string()).collect()
    }

    fn params() -> RwrParams {
        RwrParams { restart_prob: 0.5, max_iters: 500, tol: 1e-12, parallel_threshold: usize::MAX }
    }

    #[test]
    fn test_single_layer_matches_plain_walk() {
        let g = graph(&[("X", "Y"), ("Y", "Z")]);
        let plain = propagate(&g, &seeds(&["X"]), &params()).unwrap();
        let multiplex = Multiplex::new().with_layer("fi", g, 1.0);
        let merged = multiplex.propagate(&seeds(&["X"]), &params()).unwrap();
        assert_eq!(plain, merged);
    }

    #[test]
    fn test_union_of_layer_genes_sums_to_one() {
        let fi = graph(&[("X", "Y"), ("Y", "Z")]);
        let ppi = graph(&[("X", "W")]);
        let multiplex = Multiplex::new().with_layer("fi", fi, 2.0).with_layer("ppi", ppi, 1.0);
        let result = multiplex.propagate(&seeds(&["X"]), &params()).unwrap();

        let genes: Vec<&str> = result.scores.keys().map(|s| s.as_str()).collect();
        assert_eq!(genes, vec!["W", "X", "Y", "Z"]);
        let total: f64 = result.scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_layer_without_seeds_is_skipped() {
        let fi = graph(&[("X", "Y")]);
        let other = graph(&[("P", "Q")]);
        let multiplex = Multiplex::new().with_layer("fi", fi, 1.0).with_layer("other", other, 1.0);
        let result = multiplex.propagate(&seeds(&["X"]), &params()).unwrap();
        assert_eq!(result.score("P"), None);
        assert!(result.score("X").unwrap() > 0.0);
    }

    #[test]
    fn test_no_layer_with_seeds_fails() {
        let multiplex = Multiplex::new().with_layer("fi", graph(&[("X", "Y")]), 1.0);
        let err = multiplex.propagate(&seeds(&["Q"]), &params()).unwrap_err();
        assert!(matches!(err, PathwiseError::EmptySeedSet { .. }));
    }

    #[test]
    fn test_merge_follows_layer_weights() {
        let fi = graph(&[("X", "Y"), ("Y", "Z")]);
        let ppi = graph(&[("X", "Y"), ("X", "W")]);
        let s = seeds(&["X"]);
        let fi_run = propagate(&fi, &s, &params()).unwrap();
        let ppi_run = propagate(&ppi, &s, &params()).unwrap();

        let multiplex = Multiplex::new().with_layer("fi", fi, 3.0).with_layer("ppi", ppi, 1.0);
        let merged = multiplex.propagate(&s, &params()).unwrap();

        let mut expected: BTreeMap<GeneSymbol, f64> = BTreeMap::new();
        for (w, run) in [(0.75, &fi_run), (0.25, &ppi_run)] {
            for (gene, score) in &run.scores {
                *expected.entry(gene.clone()).or_insert(0.0) += w * score;
            }
        }
        let total: f64 = expected.values().sum();
        for (gene, score) in &expected {
            let got = merged.score(gene).unwrap();
            assert!((got - score / total).abs() < 1e-12, "{gene}: {got} vs {}", score / total);
        }

        // Z only lives in fi; flipping the weights must shrink its share
        let flipped = Multiplex::new()
            .with_layer("fi", graph(&[("X", "Y"), ("Y", "Z")]), 1.0)
            .with_layer("ppi", graph(&[("X", "Y"), ("X", "W")]), 3.0)
            .propagate(&s, &params())
            .unwrap();
        assert!(flipped.score("Z").unwrap() < merged.score("Z").unwrap());
    }

    #[test]
    fn test_invalid_layer_weight_is_rejected() {
        for bad in [-1.0, f64::NAN] {
            let multiplex = Multiplex::new()
                .with_layer("fi", graph(&[("X", "Y"), ("Y", "Z")]), 1.0)
                .with_layer("ppi", graph(&[("X", "Z")]), bad);
            let err = multiplex.propagate(&seeds(&["X"]), &params()).unwrap_err();
            assert!(matches!(err, PathwiseError::InvalidConfig(_)), "weight {bad}: {err}");
        }
    }

    #[test]
    fn test_all_zero_weights_have_no_contributing_layer() {
        let multiplex = Multiplex::new().with_layer("fi", graph(&[("X", "Y")]), 0.0);
        let err = multiplex.propagate(&seeds(&["X"]), &params()).unwrap_err();
        assert!(matches!(err, PathwiseError::EmptySeedSet { .. }));
    }
}
