//! Attribution of observations to network communities

use std::collections::HashMap;

use rayon::prelude::*;

use crate::cluster::{ClusterAssignment, CommunityId};
use crate::data::ObservationPoint;
use crate::error::{AnalysisError, Result};
use crate::spatial::{NetworkNode, NodeId, SpatialIndex};

/// Below this many points the join runs on the calling thread
const PARALLEL_THRESHOLD: usize = 1000;

/// Node id to community lookup built from network nodes
pub fn node_communities(nodes: &[NetworkNode]) -> HashMap<NodeId, CommunityId> {
    nodes.iter().map(|n| (n.id, n.community_id)).collect()
}

/// Join every observation to the community of its nearest network node.
///
/// Output order matches `points`. A nearest node missing from
/// `node_communities` aborts the join.
pub fn assign(
    points: &[ObservationPoint],
    index: &SpatialIndex,
    node_communities: &HashMap<NodeId, CommunityId>,
) -> Result<Vec<ClusterAssignment>> {
    log::info!("Assigning {} observations to communities", points.len());

    let attribute = |point: &ObservationPoint| -> Result<(ClusterAssignment, f64)> {
        let nearest = index.nearest(point.x, point.y);
        let community = node_communities
            .get(&nearest.node_id)
            .copied()
            .ok_or(AnalysisError::UnknownNode {
                node_id: nearest.node_id,
            })?;
        Ok((ClusterAssignment::new(point, community), nearest.distance))
    };

    let results: Vec<Result<(ClusterAssignment, f64)>> = if points.len() < PARALLEL_THRESHOLD {
        points.iter().map(attribute).collect()
    } else {
        points.par_iter().map(attribute).collect()
    };

    // Sequential pass so the first failing observation is the one reported
    let mut assignments = Vec::with_capacity(points.len());
    let mut max_distance = 0.0f64;
    for result in results {
        let (assignment, distance) = result?;
        max_distance = max_distance.max(distance);
        assignments.push(assignment);
    }

    log::debug!("Largest observation-to-node distance: {:.3}", max_distance);

    Ok(assignments)
}
