//! Community attribution and per-community label statistics

pub mod assignment;
pub mod counts;
pub mod ratios;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::data::{Label, ObservationPoint};

/// Identifier of a community produced by the external community detection
pub type CommunityId = u32;

/// An observation joined to the community of its nearest network node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Unique row identifier of the observation
    pub id: u32,

    pub x: f64,
    pub y: f64,
    pub label: Label,

    /// Community of the nearest network node
    pub cluster_id: CommunityId,
}

impl ClusterAssignment {
    pub fn new(point: &ObservationPoint, cluster_id: CommunityId) -> Self {
        Self {
            id: point.id,
            x: point.x,
            y: point.y,
            label: point.label,
            cluster_id,
        }
    }
}

/// Sorted distinct community ids taken from the network nodes
pub fn community_universe(nodes: &[crate::spatial::NetworkNode]) -> Vec<CommunityId> {
    nodes.iter().map(|n| n.community_id).sorted_unstable().dedup().collect()
}

/// Sorted distinct labels present in the observations
pub fn label_universe(points: &[ObservationPoint]) -> Vec<Label> {
    points.iter().map(|p| p.label).sorted_unstable().dedup().collect()
}
