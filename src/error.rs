//! Error types for the community label analyzer

use thiserror::Error;

use crate::cluster::CommunityId;
use crate::data::Label;
use crate::spatial::NodeId;

/// Result type alias for the analysis core
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures raised by the attribution and permutation pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Spatial index requested over an empty node set
    #[error("cannot build a spatial index over zero network nodes")]
    EmptyIndex,

    /// Nearest node has no entry in the community table
    #[error("network node {node_id} has no community assignment")]
    UnknownNode { node_id: NodeId },

    /// Assignment refers to a community outside the declared universe
    #[error("community {community_id} is not part of the community universe")]
    UnknownCommunity { community_id: CommunityId },

    /// Observation label outside the declared label universe
    #[error("observation {observation_id} has label {label} outside the label universe")]
    InvalidLabel { observation_id: u32, label: Label },

    /// Null distribution carries no information for a cell.
    /// Diagnostic only: logged, never returned from the pipeline.
    #[error("null distribution for community {community_id}, label {label} is degenerate")]
    DegenerateSample { community_id: CommunityId, label: Label },

    /// Non-finite coordinate in an input record
    #[error("{kind} {id} has a non-finite coordinate ({x}, {y})")]
    InvalidCoordinate { kind: &'static str, id: u32, x: f64, y: f64 },

    /// Identifier repeated in an input table
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },

    /// Configuration validation failed
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl AnalysisError {
    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
