//! Monte-Carlo label permutations
//!
//! Every realization shuffles the whole label column while coordinates and
//! community ids stay fixed, then recounts the community × label matrix.
//!
//! Realization `r` draws from `ChaCha8Rng::seed_from_u64(seed)` switched to
//! stream `r`, and shuffles with `rand`'s `SliceRandom::shuffle`, a
//! Fisher–Yates (Durstenfeld) pass from the last position down to the first.
//! Streams are independent of scheduling, so parallel and sequential runs
//! produce identical samples.

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::counts::{LabelCounter, PseudoCount, RegionLabelCounts};
use crate::cluster::{ClusterAssignment, CommunityId};
use crate::data::Label;
use crate::error::{AnalysisError, Result};

/// Count matrices of every realization, indexed `[realization, community, label]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermutationSample {
    pub communities: Vec<CommunityId>,
    pub labels: Vec<Label>,
    pub counts: Array3<u64>,
    pub pseudo_count: PseudoCount,
}

impl PermutationSample {
    /// Number of realizations
    pub fn len(&self) -> usize {
        self.counts.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count matrix of one realization
    pub fn matrix(&self, realization: usize) -> ArrayView2<'_, u64> {
        self.counts.index_axis(Axis(0), realization)
    }

    /// One realization as a standalone count table
    pub fn realization(&self, realization: usize) -> RegionLabelCounts {
        RegionLabelCounts {
            communities: self.communities.clone(),
            labels: self.labels.clone(),
            counts: self.matrix(realization).to_owned(),
            pseudo_count: self.pseudo_count,
        }
    }

    /// Null values of one (community, label) cell across realizations
    pub fn cell(&self, community_index: usize, label_index: usize) -> Vec<u64> {
        self.counts
            .index_axis(Axis(2), label_index)
            .index_axis(Axis(1), community_index)
            .to_vec()
    }

    /// Per-cell mean over realizations
    pub fn mean(&self) -> Array2<f64> {
        self.counts.mapv(|c| c as f64).mean_axis(Axis(0)).unwrap_or_else(|| {
            Array2::zeros((self.communities.len(), self.labels.len()))
        })
    }
}

/// Seeded, repeatable label-permutation test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermutationTester {
    realizations: usize,
    seed: u64,
    parallel: bool,
}

impl PermutationTester {
    pub fn new(realizations: usize, seed: u64) -> Self {
        Self {
            realizations,
            seed,
            parallel: true,
        }
    }

    /// Toggle use of the rayon pool; the sample does not depend on it
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn realizations(&self) -> usize {
        self.realizations
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Random stream of one realization
    pub fn realization_rng(&self, realization: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(realization as u64);
        rng
    }

    /// Permuted label column of one realization, as label positions
    pub fn shuffled_labels(&self, counter: &LabelCounter, realization: usize) -> Vec<usize> {
        let mut labels = counter.label_indices().to_vec();
        labels.shuffle(&mut self.realization_rng(realization));
        labels
    }

    /// Shuffle and recount `realizations` times
    pub fn run(
        &self,
        assignments: &[ClusterAssignment],
        communities: &[CommunityId],
        labels: &[Label],
        pseudo_count: PseudoCount,
    ) -> Result<PermutationSample> {
        let counter = LabelCounter::new(assignments, communities, labels, pseudo_count)?;
        self.run_with_counter(&counter)
    }

    /// Shuffle and recount against a prepared counter
    pub fn run_with_counter(&self, counter: &LabelCounter) -> Result<PermutationSample> {
        if self.realizations == 0 {
            return Err(AnalysisError::invalid_config("realizations must be at least 1"));
        }

        log::info!(
            "Running {} label permutations over {} observations (seed {})",
            self.realizations,
            counter.label_indices().len(),
            self.seed
        );

        let realize = |r: usize| -> Array2<u64> {
            let shuffled = self.shuffled_labels(counter, r);
            counter.count_with(&shuffled).counts
        };

        let matrices: Vec<Array2<u64>> = if self.parallel {
            (0..self.realizations).into_par_iter().map(realize).collect()
        } else {
            (0..self.realizations).map(realize).collect()
        };

        let shape = (self.realizations, counter.communities().len(), counter.labels().len());
        let mut counts = Array3::<u64>::zeros(shape);
        for (r, matrix) in matrices.iter().enumerate() {
            counts.index_axis_mut(Axis(0), r).assign(matrix);
        }

        log::debug!("Permutation sample shape: {:?}", counts.dim());

        Ok(PermutationSample {
            communities: counter.communities().to_vec(),
            labels: counter.labels().to_vec(),
            counts,
            pseudo_count: counter.pseudo_count(),
        })
    }
}
