//! CSV table loading for network nodes, observations and community areas

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Result};
use polars::prelude::*;

use crate::cluster::CommunityId;
use crate::data::{Label, ObservationPoint};
use crate::error::AnalysisError;
use crate::spatial::{NetworkNode, NodeId};

/// A network node as read from the node table, before the community join
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,

    /// Present when the node table already carries a `community` column
    pub community_id: Option<CommunityId>,
}

/// Open a headed CSV file as a lazy frame
fn scan_csv(path: &Path) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    Ok(LazyCsvReader::new(path).with_has_header(true).finish()?)
}

/// Extract a non-null float column
pub(crate) fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    column
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.ok_or_else(|| anyhow!("Null value in column '{}' at row {}", name, row)))
        .collect()
}

/// Extract a non-null, non-negative integer column that fits in `u32`
pub(crate) fn u32_column(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    column
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or_else(|| anyhow!("Null value in column '{}' at row {}", name, row))?;
            u32::try_from(value)
                .map_err(|_| anyhow!("Value {} in column '{}' at row {} is not a valid id", value, name, row))
        })
        .collect()
}

/// Load the network node table (`id,x,y` and an optional `community` column)
pub fn load_nodes(path: impl AsRef<Path>) -> Result<Vec<NodeRecord>> {
    let path = path.as_ref();
    log::info!("Reading node table: {}", path.display());

    let df = scan_csv(path)?.collect()?;

    let ids = u32_column(&df, "id")?;
    let xs = f64_column(&df, "x")?;
    let ys = f64_column(&df, "y")?;
    let communities = if df.column("community").is_ok() {
        Some(u32_column(&df, "community")?)
    } else {
        None
    };

    let nodes: Vec<NodeRecord> = (0..df.height())
        .map(|i| NodeRecord {
            id: ids[i],
            x: xs[i],
            y: ys[i],
            community_id: communities.as_ref().map(|c| c[i]),
        })
        .collect();

    validate_nodes(&nodes)?;
    log::info!("Loaded {} network nodes", nodes.len());

    Ok(nodes)
}

/// Reject non-finite coordinates and repeated ids in the node table
pub fn validate_nodes(nodes: &[NodeRecord]) -> crate::error::Result<()> {
    let mut seen = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !node.x.is_finite() || !node.y.is_finite() {
            return Err(AnalysisError::InvalidCoordinate {
                kind: "network node",
                id: node.id,
                x: node.x,
                y: node.y,
            });
        }
        if !seen.insert(node.id) {
            return Err(AnalysisError::DuplicateId {
                kind: "network node",
                id: node.id,
            });
        }
    }
    Ok(())
}

/// Join a community table onto node records.
///
/// A community already present on the record wins; otherwise the node must
/// appear in `communities`.
pub fn attach_communities(
    nodes: &[NodeRecord],
    communities: &HashMap<NodeId, CommunityId>,
) -> crate::error::Result<Vec<NetworkNode>> {
    nodes
        .iter()
        .map(|node| {
            let community_id = match node.community_id {
                Some(c) => c,
                None => *communities
                    .get(&node.id)
                    .ok_or(AnalysisError::UnknownNode { node_id: node.id })?,
            };
            Ok(NetworkNode::new(node.id, node.x, node.y, community_id))
        })
        .collect()
}

/// Load the labeled observation table (`id,x,y,label`)
pub fn load_observations(path: impl AsRef<Path>) -> Result<Vec<ObservationPoint>> {
    let path = path.as_ref();
    log::info!("Reading observation table: {}", path.display());

    let df = scan_csv(path)?
        .select([col("id"), col("x"), col("y"), col("label")])
        .collect()?;

    let ids = u32_column(&df, "id")?;
    let xs = f64_column(&df, "x")?;
    let ys = f64_column(&df, "y")?;
    let labels = u32_column(&df, "label")?;

    let points: Vec<ObservationPoint> = (0..df.height())
        .map(|i| ObservationPoint::new(ids[i], xs[i], ys[i], Label(labels[i])))
        .collect();

    validate_observations(&points)?;
    log::info!("Loaded {} labeled observations", points.len());

    Ok(points)
}

/// Reject non-finite coordinates and repeated ids in the observation table
pub fn validate_observations(points: &[ObservationPoint]) -> crate::error::Result<()> {
    let mut seen = HashSet::with_capacity(points.len());
    for point in points {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(AnalysisError::InvalidCoordinate {
                kind: "observation",
                id: point.id,
                x: point.x,
                y: point.y,
            });
        }
        if !seen.insert(point.id) {
            return Err(AnalysisError::DuplicateId {
                kind: "observation",
                id: point.id,
            });
        }
    }
    Ok(())
}

/// Load per-community areas (`community,area`)
pub fn load_areas(path: impl AsRef<Path>) -> Result<HashMap<CommunityId, f64>> {
    let path = path.as_ref();
    log::info!("Reading community areas: {}", path.display());

    let df = scan_csv(path)?
        .select([col("community"), col("area")])
        .collect()?;

    let communities = u32_column(&df, "community")?;
    let areas = f64_column(&df, "area")?;

    Ok(communities.into_iter().zip(areas).collect())
}
