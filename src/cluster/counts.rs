//! Per-community label counting

use std::collections::HashMap;

use itertools::Itertools;
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterAssignment, CommunityId};
use crate::data::Label;
use crate::error::{AnalysisError, Result};

/// How empty or low-count cells are padded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PseudoCount {
    /// Raw counts
    None,

    /// Every cell starts at one before accumulating
    #[default]
    Additive,

    /// Only cells without any observation are raised to one
    FillEmpty,
}

impl PseudoCount {
    #[inline]
    fn apply(self, raw: u64) -> u64 {
        match self {
            PseudoCount::None => raw,
            PseudoCount::Additive => raw + 1,
            PseudoCount::FillEmpty => raw.max(1),
        }
    }
}

/// Communities × labels count matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionLabelCounts {
    /// Row keys, sorted ascending
    pub communities: Vec<CommunityId>,

    /// Column keys, sorted ascending
    pub labels: Vec<Label>,

    /// `counts[[i, j]]` observations of `labels[j]` in `communities[i]`
    pub counts: Array2<u64>,

    pub pseudo_count: PseudoCount,
}

impl RegionLabelCounts {
    /// Count for a community and label, if both are in the universe
    pub fn get(&self, community: CommunityId, label: Label) -> Option<u64> {
        let i = self.communities.binary_search(&community).ok()?;
        let j = self.labels.binary_search(&label).ok()?;
        Some(self.counts[[i, j]])
    }

    /// Sum over every cell, pseudo-counts included
    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    /// Per-community totals
    pub fn row_sums(&self) -> Vec<u64> {
        self.counts.sum_axis(Axis(1)).to_vec()
    }

    /// Per-label totals
    pub fn column_sums(&self) -> Vec<u64> {
        self.counts.sum_axis(Axis(0)).to_vec()
    }

    /// Counts for one community, in label order
    pub fn row(&self, community_index: usize) -> ArrayView1<'_, u64> {
        self.counts.row(community_index)
    }
}

/// Counting plan for a fixed set of assignments.
///
/// Community and label positions are resolved once, so repeated counts over
/// permuted label columns only touch integer indices.
#[derive(Debug, Clone)]
pub struct LabelCounter {
    communities: Vec<CommunityId>,
    labels: Vec<Label>,
    community_index: Vec<usize>,
    label_index: Vec<usize>,
    pseudo_count: PseudoCount,
}

impl LabelCounter {
    /// Resolve every assignment against the declared universes
    pub fn new(
        assignments: &[ClusterAssignment],
        communities: &[CommunityId],
        labels: &[Label],
        pseudo_count: PseudoCount,
    ) -> Result<Self> {
        let communities: Vec<CommunityId> =
            communities.iter().copied().sorted_unstable().dedup().collect();
        let labels: Vec<Label> = labels.iter().copied().sorted_unstable().dedup().collect();

        let community_pos: HashMap<CommunityId, usize> =
            communities.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let label_pos: HashMap<Label, usize> = labels.iter().enumerate().map(|(j, &l)| (l, j)).collect();

        let mut community_index = Vec::with_capacity(assignments.len());
        let mut label_index = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let i = *community_pos
                .get(&assignment.cluster_id)
                .ok_or(AnalysisError::UnknownCommunity {
                    community_id: assignment.cluster_id,
                })?;
            let j = *label_pos.get(&assignment.label).ok_or(AnalysisError::InvalidLabel {
                observation_id: assignment.id,
                label: assignment.label,
            })?;
            community_index.push(i);
            label_index.push(j);
        }

        Ok(Self {
            communities,
            labels,
            community_index,
            label_index,
            pseudo_count,
        })
    }

    pub fn communities(&self) -> &[CommunityId] {
        &self.communities
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label positions of the assignments, in input order
    pub fn label_indices(&self) -> &[usize] {
        &self.label_index
    }

    pub fn pseudo_count(&self) -> PseudoCount {
        self.pseudo_count
    }

    /// Raw counts for the assignments with their label column replaced by
    /// `label_index` (positions into [`Self::labels`])
    pub fn raw_counts_with(&self, label_index: &[usize]) -> Array2<u64> {
        debug_assert_eq!(label_index.len(), self.community_index.len());

        let mut raw = Array2::<u64>::zeros((self.communities.len(), self.labels.len()));
        for (&i, &j) in self.community_index.iter().zip(label_index) {
            raw[[i, j]] += 1;
        }
        raw
    }

    /// Counts for the assignments with a replacement label column
    pub fn count_with(&self, label_index: &[usize]) -> RegionLabelCounts {
        let pseudo_count = self.pseudo_count;
        let counts = self.raw_counts_with(label_index).mapv(|raw| pseudo_count.apply(raw));

        RegionLabelCounts {
            communities: self.communities.clone(),
            labels: self.labels.clone(),
            counts,
            pseudo_count,
        }
    }

    /// Counts for the assignments as observed
    pub fn count_observed(&self) -> RegionLabelCounts {
        self.count_with(&self.label_index)
    }
}

/// Count observations per (community, label) cell
pub fn count(
    assignments: &[ClusterAssignment],
    communities: &[CommunityId],
    labels: &[Label],
    pseudo_count: PseudoCount,
) -> Result<RegionLabelCounts> {
    Ok(LabelCounter::new(assignments, communities, labels, pseudo_count)?.count_observed())
}
