//! Street-network nodes and nearest-node lookup

pub mod kdtree;

pub use kdtree::SpatialIndex;

use serde::{Deserialize, Serialize};

use crate::cluster::CommunityId;

/// Identifier of a street-network node
pub type NodeId = u32;

/// A street-network node with planar coordinates and its community
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Node identifier as used by the community-detection output
    pub id: NodeId,

    /// Planar x coordinate
    pub x: f64,

    /// Planar y coordinate
    pub y: f64,

    /// Community assigned by the external community-detection run
    pub community_id: CommunityId,
}

impl NetworkNode {
    pub fn new(id: NodeId, x: f64, y: f64, community_id: CommunityId) -> Self {
        Self {
            id,
            x,
            y,
            community_id,
        }
    }
}
