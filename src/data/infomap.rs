//! Infomap `.clu` community files
//!
//! Space separated, two comment lines followed by `id cluster flow` rows.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use itertools::Itertools;
use polars::prelude::*;

use crate::cluster::CommunityId;
use crate::data::tables::u32_column;
use crate::spatial::NodeId;

const HEADER_LINES: usize = 2;

/// Load the node-to-community table produced by Infomap.
///
/// Rows are keyed by the `.clu` node id, so the node table must use the same
/// ids as the network given to Infomap; there is no positional join.
pub fn load_communities(path: impl AsRef<Path>) -> Result<HashMap<NodeId, CommunityId>> {
    let path = path.as_ref();
    log::info!("Reading community assignments: {}", path.display());

    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(false)
        .with_separator(b' ')
        .with_skip_rows(HEADER_LINES)
        .finish()?
        .select([
            col("column_1").alias("id"),
            col("column_2").alias("cluster"),
            col("column_3").alias("flow"),
        ])
        .sort(["id"], Default::default())
        .collect()?;

    let ids = u32_column(&df, "id")?;
    let clusters = u32_column(&df, "cluster")?;

    let mut table = HashMap::with_capacity(ids.len());
    for (id, cluster) in ids.into_iter().zip(clusters) {
        if table.insert(id, cluster).is_some() {
            return Err(anyhow!("Node {} appears more than once in {}", id, path.display()));
        }
    }

    let distinct: Vec<CommunityId> = table.values().copied().sorted_unstable().dedup().collect();
    log::info!(
        "Loaded {} node assignments across {} communities",
        table.len(),
        distinct.len()
    );
    log::debug!("Communities found: {:?}", distinct);

    Ok(table)
}
