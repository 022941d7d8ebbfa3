//! Configuration management for the community label analyzer

use serde::{Deserialize, Serialize};

use crate::cluster::counts::PseudoCount;
use crate::error::{AnalysisError, Result};
use crate::stats::density::{linspace, Bandwidth};

/// Parameters of one attribution and permutation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of label permutations in the null sample
    pub realizations: usize,

    /// Seed from which every realization's random stream is derived
    pub seed: u64,

    /// Padding applied to count cells
    pub pseudo_count: PseudoCount,

    /// Kernel bandwidth rule for the null densities
    pub bandwidth: Bandwidth,

    /// Number of evaluation points on [0, 1]
    pub grid_points: usize,

    /// Run realizations on the rayon pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            realizations: 1000,
            seed: 0,
            pseudo_count: PseudoCount::Additive,
            bandwidth: Bandwidth::ScaledStd(0.25),
            grid_points: 100,
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with custom values
    pub fn new(
        realizations: usize,
        seed: u64,
        pseudo_count: PseudoCount,
        bandwidth: Bandwidth,
        grid_points: usize,
    ) -> Self {
        Self {
            realizations,
            seed,
            pseudo_count,
            bandwidth,
            grid_points,
            parallel: true,
        }
    }

    /// Check the values before any work is done
    pub fn validate(&self) -> Result<()> {
        if self.realizations == 0 {
            return Err(AnalysisError::invalid_config("realizations must be at least 1"));
        }
        if self.grid_points < 2 {
            return Err(AnalysisError::invalid_config(format!(
                "grid_points must be at least 2, got {}",
                self.grid_points
            )));
        }
        self.bandwidth.validate()
    }

    /// Evaluation grid for the null densities
    pub fn support(&self) -> Vec<f64> {
        linspace(0.0, 1.0, self.grid_points)
    }
}
