//! Core library functions for the community label analyzer
//!
//! Attributes labeled point observations to the street-network community of
//! their nearest node, then tests the per-community label composition
//! against a seeded label-permutation null model.

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod spatial;
pub mod stats;
pub mod storage;

pub use cluster::counts::{PseudoCount, RegionLabelCounts};
pub use cluster::{ClusterAssignment, CommunityId};
pub use config::AnalysisConfig;
pub use data::{Label, ObservationPoint};
pub use error::{AnalysisError, Result};
pub use spatial::{NetworkNode, NodeId, SpatialIndex};
pub use stats::density::{Bandwidth, DensityEstimator};
pub use stats::permutation::{PermutationSample, PermutationTester};
