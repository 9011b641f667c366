//! Core value types shared by the index, the propagator and the ranker.

use serde::{Deserialize, Serialize};

/// Approved gene symbol (e.g. "BTG4"). Symbols are the join key across
/// every table in a run.
pub type GeneSymbol = String;

/// Stable pathway identifier (e.g. Reactome "R-HSA-69278").
pub type PathwayId = String;

// ---------------------------------------------------------------------------
// Ranked output row
// ---------------------------------------------------------------------------

/// One row of the ranked output table.
///
/// A score that a gene did not receive is `None` rather than `0.0`: "not
/// modelled" and "modelled but negligible" are different answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub gene: GeneSymbol,
    pub selectivity_score: Option<f64>,
    pub propagation_score: Option<f64>,
    /// 1-based position in the ranked table.
    pub rank: usize,
}

impl ScoreRecord {
    /// The score that decides this record's position.
    pub fn governing_score(&self) -> Option<f64> {
        self.propagation_score.or(self.selectivity_score)
    }
}

// ---------------------------------------------------------------------------
// Malformed input bookkeeping
// ---------------------------------------------------------------------------

/// Tally of input rows skipped by a loader.
///
/// Only the first few line numbers are retained so a pathological file does
/// not blow up memory; the count is always exact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedRows {
    pub count: usize,
    pub sample_lines: Vec<usize>,
}

const MAX_SAMPLE_LINES: usize = 10;

impl SkippedRows {
    pub fn record(&mut self, line: usize, reason: &str) {
        self.count += 1;
        if self.sample_lines.len() < MAX_SAMPLE_LINES {
            self.sample_lines.push(line);
        }
        tracing::debug!(line, reason, "Skipping malformed row");
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Emit one summary warning for `source` if anything was skipped.
    pub fn report(&self, source: &str) {
        if !self.is_empty() {
            tracing::warn!(
                source,
                skipped = self.count,
                first_lines = ?self.sample_lines,
                "Skipped malformed rows"
            );
        }
    }
}
