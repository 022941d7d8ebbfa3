//! Observed counts against their permutation null

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::cluster::counts::RegionLabelCounts;
use crate::cluster::CommunityId;
use crate::data::Label;
use crate::error::{AnalysisError, Result};
use crate::stats::density::DensityEstimator;
use crate::stats::permutation::PermutationSample;

/// Empirical tail probabilities of an observed value under a null sample.
///
/// Uses the `(1 + k) / (1 + R)` estimator so a p-value is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmpiricalTest {
    /// P(null >= observed)
    pub p_greater: f64,

    /// P(null <= observed)
    pub p_less: f64,

    pub p_two_sided: f64,
}

pub fn empirical_test(observed: f64, null: &[f64]) -> EmpiricalTest {
    let r = null.len() as f64;
    let greater = null.iter().filter(|&&v| v >= observed).count() as f64;
    let less = null.iter().filter(|&&v| v <= observed).count() as f64;

    let p_greater = (1.0 + greater) / (1.0 + r);
    let p_less = (1.0 + less) / (1.0 + r);

    EmpiricalTest {
        p_greater,
        p_less,
        p_two_sided: (2.0 * p_greater.min(p_less)).min(1.0),
    }
}

/// One (community, label) cell: observed value, null summary and density
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellComparison {
    pub community_id: CommunityId,
    pub label: Label,

    /// Observed count, padding included
    pub observed: u64,

    /// Observed row sum used to normalise every value of this community
    pub community_total: u64,

    pub observed_ratio: f64,
    pub null_mean: f64,
    pub null_std: f64,

    /// Absent when the null has no spread
    pub z_score: Option<f64>,

    pub test: EmpiricalTest,

    /// Null density of the normalised count on the comparison grid
    pub density: Vec<f64>,

    pub degenerate: bool,
}

/// Every cell compared against its null distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullComparison {
    pub support: Vec<f64>,
    pub realizations: usize,
    pub estimator: DensityEstimator,
    pub cells: Vec<CellComparison>,
}

impl NullComparison {
    pub fn cell(&self, community_id: CommunityId, label: Label) -> Option<&CellComparison> {
        self.cells
            .iter()
            .find(|c| c.community_id == community_id && c.label == label)
    }

    /// Cells whose two-sided p-value is below `alpha`
    pub fn significant(&self, alpha: f64) -> impl Iterator<Item = &CellComparison> {
        self.cells.iter().filter(move |c| c.test.p_two_sided < alpha)
    }
}

/// Compare observed counts with the permutation sample cell by cell.
///
/// Both observed and null counts are divided by the observed row sum of the
/// community before density estimation.
pub fn compare(
    observed: &RegionLabelCounts,
    sample: &PermutationSample,
    estimator: &DensityEstimator,
    support: &[f64],
) -> Result<NullComparison> {
    if observed.communities != sample.communities || observed.labels != sample.labels {
        return Err(AnalysisError::invalid_config(
            "observed counts and permutation sample cover different communities or labels",
        ));
    }
    if sample.is_empty() {
        return Err(AnalysisError::invalid_config("permutation sample is empty"));
    }

    let row_sums = observed.row_sums();
    let n_labels = observed.labels.len();

    let cells = (0..observed.communities.len() * n_labels)
        .into_par_iter()
        .map(|flat| {
            let (i, j) = (flat / n_labels, flat % n_labels);
            let community_id = observed.communities[i];
            let label = observed.labels[j];
            let observed_count = observed.counts[[i, j]];
            let community_total = row_sums[i];

            let raw_null: Vec<f64> = sample.cell(i, j).into_iter().map(|c| c as f64).collect();
            let null_mean = raw_null.iter().mean();
            let null_std = if raw_null.len() > 1 { raw_null.iter().std_dev() } else { 0.0 };

            let degenerate = null_std.is_nan() || null_std <= 0.0;
            if degenerate {
                log::warn!("{}", AnalysisError::DegenerateSample { community_id, label });
            }

            let z_score = (!degenerate).then(|| (observed_count as f64 - null_mean) / null_std);
            let test = empirical_test(observed_count as f64, &raw_null);

            let scale = if community_total > 0 {
                community_total as f64
            } else {
                1.0
            };
            let normalized: Vec<f64> = raw_null.iter().map(|v| v / scale).collect();

            Ok(CellComparison {
                community_id,
                label,
                observed: observed_count,
                community_total,
                observed_ratio: observed_count as f64 / scale,
                null_mean,
                null_std,
                z_score,
                test,
                density: estimator.estimate(&normalized, support)?,
                degenerate,
            })
        })
        .collect::<Result<Vec<CellComparison>>>()?;

    let significant = cells.iter().filter(|c| c.test.p_two_sided < 0.05).count();
    log::info!(
        "Compared {} cells against {} realizations, {} with two-sided p < 0.05",
        cells.len(),
        sample.len(),
        significant
    );

    Ok(NullComparison {
        support: support.to_vec(),
        realizations: sample.len(),
        estimator: *estimator,
        cells,
    })
}
