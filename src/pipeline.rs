//! End-to-end attribution and permutation analysis

use std::collections::HashMap;

use serde::Serialize;

use crate::cluster::assignment::{assign, node_communities};
use crate::cluster::counts::{LabelCounter, RegionLabelCounts};
use crate::cluster::ratios::{counts_per_area, label_ratios, AreaDensity, LabelRatios};
use crate::cluster::{community_universe, label_universe, ClusterAssignment, CommunityId};
use crate::config::AnalysisConfig;
use crate::data::{Label, ObservationPoint};
use crate::error::Result;
use crate::spatial::{NetworkNode, SpatialIndex};
use crate::stats::density::DensityEstimator;
use crate::stats::permutation::{PermutationSample, PermutationTester};
use crate::stats::significance::{compare, NullComparison};

/// Everything produced by one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    pub communities: Vec<CommunityId>,
    pub labels: Vec<Label>,
    pub assignments: Vec<ClusterAssignment>,
    pub observed: RegionLabelCounts,
    pub ratios: LabelRatios,
    pub area_densities: Option<Vec<AreaDensity>>,
    pub sample: PermutationSample,
    pub comparison: NullComparison,
}

/// Run the analysis over loaded network nodes and observations.
///
/// The community universe comes from the nodes and the label universe from
/// the observations.
pub fn run(
    nodes: &[NetworkNode],
    points: &[ObservationPoint],
    areas: Option<&HashMap<CommunityId, f64>>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput> {
    config.validate()?;

    // 1. Spatial index over the street network
    let index = SpatialIndex::build(nodes)?;
    let communities = community_universe(nodes);
    let labels = label_universe(points);
    log::info!(
        "Network has {} nodes in {} communities, observations carry {} labels",
        index.len(),
        communities.len(),
        labels.len()
    );

    // 2. Observations to communities
    let assignments = assign(points, &index, &node_communities(nodes))?;

    // 3. Observed counts
    let counter = LabelCounter::new(&assignments, &communities, &labels, config.pseudo_count)?;
    let observed = counter.count_observed();
    log::info!("Observations per community: {:?}", observed.row_sums());

    let ratios = label_ratios(&counter);
    let area_densities = areas.map(|areas| counts_per_area(&counter, areas)).transpose()?;

    // 4. Null sample
    let sample = PermutationTester::new(config.realizations, config.seed)
        .with_parallel(config.parallel)
        .run_with_counter(&counter)?;

    // 5. Observed against null
    let estimator = DensityEstimator::new(config.bandwidth);
    let comparison = compare(&observed, &sample, &estimator, &config.support())?;

    Ok(AnalysisOutput {
        communities,
        labels,
        assignments,
        observed,
        ratios,
        area_densities,
        sample,
        comparison,
    })
}
