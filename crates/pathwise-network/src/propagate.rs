//! Random walk with restart (RWR).
//!
//! r      = uniform 1/|S| on the seed nodes S, 0 elsewhere
//! p₀     = r
//! pₜ₊₁   = (1 − α)·Wᵀ·pₜ + α·r
//!
//! with α the restart probability and W the row-normalised transition
//! matrix. Iteration stops when ‖pₜ₊₁ − pₜ‖₁ < tol or after `max_iters`
//! steps; the final vector is rescaled to sum to 1 over the layer's nodes.

use std::collections::{BTreeMap, BTreeSet};

use pathwise_common::{GeneSymbol, PathwiseError, PropagationConfig, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::PropagationLayer;

/// Walk parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RwrParams {
    pub restart_prob: f64,
    pub max_iters: usize,
    pub tol: f64,
    /// Node count at or above which the transition product uses rayon
    pub parallel_threshold: usize,
}

impl Default for RwrParams {
    fn default() -> Self {
        Self::from(&PropagationConfig::default())
    }
}

impl From<&PropagationConfig> for RwrParams {
    fn from(cfg: &PropagationConfig) -> Self {
        Self {
            restart_prob: cfg.restart_prob,
            max_iters: cfg.max_iters,
            tol: cfg.tol,
            parallel_threshold: cfg.parallel_threshold,
        }
    }
}

impl RwrParams {
    fn validate(&self) -> Result<()> {
        if !(self.restart_prob > 0.0 && self.restart_prob < 1.0) {
            return Err(PathwiseError::InvalidConfig(format!(
                "restart probability must be in (0, 1), got {}",
                self.restart_prob
            )));
        }
        if !(self.tol > 0.0) || self.max_iters == 0 {
            return Err(PathwiseError::InvalidConfig(format!(
                "need tol > 0 and max_iters > 0, got tol={} max_iters={}",
                self.tol, self.max_iters
            )));
        }
        Ok(())
    }
}

/// Steady-state visitation scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    /// One entry per node of the network; genes outside it are absent
    pub scores: BTreeMap<GeneSymbol, f64>,
    /// Seeds that were nodes of the network
    pub seeds_used: Vec<GeneSymbol>,
    /// Requested seeds that were not
    pub seeds_missing: Vec<GeneSymbol>,
    pub iterations: usize,
    pub converged: bool,
    /// L1 change of the last iteration
    pub residual: f64,
}

impl PropagationResult {
    pub fn score(&self, gene: &str) -> Option<f64> {
        self.scores.get(gene).copied()
    }
}

/// Run RWR on `layer` from `seeds`.
///
/// Seeds that are not nodes of the layer are dropped with a warning. If
/// none remain the call fails with [`PathwiseError::EmptySeedSet`].
/// Hitting `max_iters` without converging is not an error: the partial
/// vector is returned with `converged == false`.
pub fn propagate<L>(layer: &L, seeds: &BTreeSet<GeneSymbol>, params: &RwrParams) -> Result<PropagationResult>
where
    L: PropagationLayer + ?Sized,
{
    params.validate()?;

    let mut seed_idx: Vec<usize> = Vec::new();
    let mut seeds_missing: Vec<GeneSymbol> = Vec::new();
    for seed in seeds {
        match layer.node_index(seed) {
            Some(i) => seed_idx.push(i),
            None => seeds_missing.push(seed.clone()),
        }
    }

    if !seeds_missing.is_empty() {
        warn!(missing = ?seeds_missing, "Seeds absent from the interaction network");
    }
    if seed_idx.is_empty() {
        return Err(PathwiseError::EmptySeedSet {
            requested: seeds.iter().cloned().collect::<Vec<_>>().join(", "),
        });
    }

    let n = layer.node_count();
    let alpha = params.restart_prob;
    let parallel = n >= params.parallel_threshold;

    let mut restart = vec![0.0f64; n];
    let share = 1.0 / seed_idx.len() as f64;
    for &i in &seed_idx {
        restart[i] = share;
    }

    let mut p = restart.clone();
    let mut next = vec![0.0f64; n];
    let mut iterations = 0;
    let mut residual = f64::INFINITY;
    let mut converged = false;

    while iterations < params.max_iters {
        layer.spread(&p, &mut next, parallel);
        residual = 0.0;
        for i in 0..n {
            let v = (1.0 - alpha) * next[i] + alpha * restart[i];
            residual += (v - p[i]).abs();
            next[i] = v;
        }
        std::mem::swap(&mut p, &mut next);
        iterations += 1;

        if residual < params.tol {
            converged = true;
            break;
        }
    }
    debug!(iterations, residual, "RWR iteration finished");

    if !converged {
        warn!(
            iterations,
            residual,
            tol = params.tol,
            "RWR did not converge; returning partial scores"
        );
    }

    let total: f64 = p.iter().sum();
    if total > 0.0 {
        for v in &mut p {
            *v /= total;
        }
    }

    let names = layer.node_names();
    let scores: BTreeMap<GeneSymbol, f64> = names.iter().cloned().zip(p).collect();
    let seeds_used: Vec<GeneSymbol> = seed_idx.iter().map(|&i| names[i].clone()).collect();

    info!(
        n_nodes = n,
        n_seeds = seeds_used.len(),
        iterations,
        converged,
        parallel,
        "Propagated seed mass"
    );

    Ok(PropagationResult {
        scores,
        seeds_used,
        seeds_missing,
        iterations,
        converged,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InteractionGraph, InteractionRow};

    fn graph(edges: &[(&str, &str, f64)]) -> InteractionGraph {
        InteractionGraph::build(edges.iter().map(|&(a, b, w)| InteractionRow::new(a, b, Some(w))))
    }

    fn seeds(genes: &[&str]) -> BTreeSet<GeneSymbol> {
        genes.iter().map(|s| s.to_string()).collect()
    }

    fn params(restart_prob: f64) -> RwrParams {
        RwrParams { restart_prob, max_iters: 1_000, tol: 1e-12, parallel_threshold: usize::MAX }
    }

    #[test]
    fn test_scores_decay_with_distance() {
        let g = graph(&[("X", "Y", 1.0), ("Y", "Z", 1.0)]);
        let result = propagate(&g, &seeds(&["X"]), &params(0.5)).unwrap();
        assert!(result.converged);
        let (x, y, z) = (result.score("X").unwrap(), result.score("Y").unwrap(), result.score("Z").unwrap());
        assert!(z < y, "Z ({z}) should trail Y ({y})");
        assert!(y < x);
    }

    #[test]
    fn test_scores_sum_to_one() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", 2.0), ("C", "D", 0.5), ("D", "A", 1.0), ("B", "D", 1.0)]);
        let result = propagate(&g, &seeds(&["A", "C"]), &params(0.7)).unwrap();
        let total: f64 = result.scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "sum = {total}");
        assert_eq!(result.scores.len(), 4);
    }

    #[test]
    fn test_rerun_is_identical() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", 2.0), ("C", "A", 0.5)]);
        let s = seeds(&["B"]);
        let first = propagate(&g, &s, &params(0.3)).unwrap();
        let second = propagate(&g, &s, &params(0.3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_isolated_seed_keeps_its_mass() {
        let g = InteractionGraph::build(vec![
            InteractionRow::new("A", "B", None),
            InteractionRow::new("S", "S", None),
        ]);
        let result = propagate(&g, &seeds(&["S"]), &params(0.5)).unwrap();
        assert!((result.score("S").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(result.score("A"), Some(0.0));
        assert_eq!(result.score("B"), Some(0.0));
    }

    #[test]
    fn test_isolated_seed_steady_state_is_restart_share() {
        // S is isolated; A–B is a connected pair seeded through A
        let g = InteractionGraph::build(vec![
            InteractionRow::new("A", "B", None),
            InteractionRow::new("S", "S", None),
        ]);
        let alpha = 0.4;
        let result = propagate(&g, &seeds(&["A", "S"]), &params(alpha)).unwrap();
        // before rescaling S holds α/2 and the A–B component holds 1/2
        let expected = (alpha / 2.0) / (alpha / 2.0 + 0.5);
        assert!((result.score("S").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_missing_genes_have_no_score() {
        let g = graph(&[("A", "B", 1.0)]);
        let result = propagate(&g, &seeds(&["A", "NOT_IN_GRAPH"]), &params(0.7)).unwrap();
        assert_eq!(result.score("NOT_IN_GRAPH"), None);
        assert_eq!(result.seeds_used, vec!["A".to_string()]);
        assert_eq!(result.seeds_missing, vec!["NOT_IN_GRAPH".to_string()]);
    }

    #[test]
    fn test_empty_seed_set_is_an_error() {
        let g = graph(&[("A", "B", 1.0)]);
        let err = propagate(&g, &BTreeSet::new(), &params(0.7)).unwrap_err();
        assert!(matches!(err, PathwiseError::EmptySeedSet { .. }));

        let err = propagate(&g, &seeds(&["Q"]), &params(0.7)).unwrap_err();
        assert!(err.to_string().contains('Q'));
    }

    #[test]
    fn test_non_convergence_returns_partial_result() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", 1.0)]);
        let p = RwrParams { restart_prob: 0.1, max_iters: 2, tol: 1e-15, parallel_threshold: usize::MAX };
        let result = propagate(&g, &seeds(&["A"]), &p).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 2);
        let total: f64 = result.scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let edges: Vec<(String, String)> = (0..50)
            .map(|i| (format!("G{i}"), format!("G{}", (i + 1) % 50)))
            .collect();
        let g = InteractionGraph::build(edges.iter().map(|(a, b)| InteractionRow::new(a, b, None)));
        let s = seeds(&["G0", "G25"]);
        let seq = propagate(&g, &s, &params(0.7)).unwrap();
        let par = propagate(&g, &s, &RwrParams { parallel_threshold: 0, ..params(0.7) }).unwrap();
        assert_eq!(seq.scores, par.scores);
    }

    #[test]
    fn test_invalid_restart_prob_rejected() {
        let g = graph(&[("A", "B", 1.0)]);
        assert!(propagate(&g, &seeds(&["A"]), &params(1.0)).is_err());
        assert!(propagate(&g, &seeds(&["A"]), &params(0.0)).is_err());
    }
}
