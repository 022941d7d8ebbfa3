//! Label composition of each community

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::cluster::counts::LabelCounter;
use crate::cluster::CommunityId;
use crate::data::Label;
use crate::error::{AnalysisError, Result};

/// Share of each label within each community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRatios {
    pub communities: Vec<CommunityId>,
    pub labels: Vec<Label>,

    /// `ratios[[i, j]]` fraction of community `i` observations with label `j`.
    /// Communities without observations have all-zero rows.
    pub ratios: Array2<f64>,

    /// Observations per community
    pub community_totals: Vec<u64>,

    /// Fraction of all observations carrying each label
    pub reference: Vec<f64>,
}

/// Compute per-community label shares from raw (unpadded) counts
pub fn label_ratios(counter: &LabelCounter) -> LabelRatios {
    let raw = counter.raw_counts_with(counter.label_indices());
    let total = raw.sum();

    let community_totals: Vec<u64> = raw.rows().into_iter().map(|row| row.sum()).collect();

    let mut ratios = Array2::<f64>::zeros(raw.dim());
    for ((i, j), &count) in raw.indexed_iter() {
        if community_totals[i] > 0 {
            ratios[[i, j]] = count as f64 / community_totals[i] as f64;
        }
    }

    let reference = raw
        .columns()
        .into_iter()
        .map(|column| {
            if total > 0 {
                column.sum() as f64 / total as f64
            } else {
                0.0
            }
        })
        .collect();

    LabelRatios {
        communities: counter.communities().to_vec(),
        labels: counter.labels().to_vec(),
        ratios,
        community_totals,
        reference,
    }
}

/// Observation count of a community normalised by its area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaDensity {
    pub community_id: CommunityId,
    pub count: u64,
    pub area: f64,
    pub per_area: f64,
}

/// Observations per unit area for every community
pub fn counts_per_area(counter: &LabelCounter, areas: &HashMap<CommunityId, f64>) -> Result<Vec<AreaDensity>> {
    let raw = counter.raw_counts_with(counter.label_indices());

    counter
        .communities()
        .iter()
        .zip(raw.rows())
        .map(|(&community_id, row)| {
            let area = *areas
                .get(&community_id)
                .ok_or(AnalysisError::UnknownCommunity { community_id })?;
            if !(area > 0.0 && area.is_finite()) {
                return Err(AnalysisError::invalid_config(format!(
                    "area of community {} must be positive, got {}",
                    community_id, area
                )));
            }
            let count = row.sum();
            Ok(AreaDensity {
                community_id,
                count,
                area,
                per_area: count as f64 / area,
            })
        })
        .collect()
}
