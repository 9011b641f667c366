//! Layer weight vector for multiplex propagation.

use pathwise_common::{PathwiseError, Result};
use serde::{Deserialize, Serialize};

/// Named, non-negative weights, one per network layer.
/// After `normalise()` the weights sum to 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerWeights {
    entries: Vec<(String, f64)>,
}

impl LayerWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, weight: f64) {
        self.entries.push((name.to_string(), weight));
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Every weight must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        match self.entries.iter().find(|(_, w)| !(w.is_finite() && *w >= 0.0)) {
            Some((name, w)) => Err(PathwiseError::InvalidConfig(format!(
                "layer {name} has invalid weight {w}"
            ))),
            None => Ok(()),
        }
    }

    /// Rescale weights to sum to 1.0. Fails unless the sum is positive.
    pub fn normalise(&mut self) -> Result<()> {
        self.validate()?;
        let sum = self.sum();
        if !(sum > 0.0) {
            return Err(PathwiseError::InvalidConfig(
                "layer weights sum to zero".to_string(),
            ));
        }
        for (_, w) in &mut self.entries {
            *w /= sum;
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[(String, f64)] {
        &self.entries
    }
}
