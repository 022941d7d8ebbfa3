//! Property-based tests using proptest

use community_label_analyzer::cluster::counts::{count, LabelCounter};
use community_label_analyzer::stats::density::linspace;
use community_label_analyzer::{ClusterAssignment, DensityEstimator, Label, NodeId, PermutationTester, PseudoCount, SpatialIndex};
use proptest::prelude::*;

fn brute_force(nodes: &[(NodeId, f64, f64)], x: f64, y: f64) -> NodeId {
    let mut best = (f64::INFINITY, NodeId::MAX);
    for &(id, nx, ny) in nodes {
        let d = (nx - x).powi(2) + (ny - y).powi(2);
        if d < best.0 || (d == best.0 && id < best.1) {
            best = (d, id);
        }
    }
    best.1
}

fn assignments_from(cells: &[(u32, u32)]) -> Vec<ClusterAssignment> {
    cells
        .iter()
        .enumerate()
        .map(|(id, &(cluster_id, label))| ClusterAssignment {
            id: id as u32,
            x: 0.0,
            y: 0.0,
            label: Label(label),
            cluster_id,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_nearest_matches_brute_force(
        coords in prop::collection::vec((-100i32..100, -100i32..100), 1..300),
        queries in prop::collection::vec((-120.0f64..120.0, -120.0f64..120.0), 1..50)
    ) {
        // Integer coordinates make exact ties common
        let nodes: Vec<(NodeId, f64, f64)> = coords
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| (id as NodeId, x as f64, y as f64))
            .collect();
        let index = SpatialIndex::from_coordinates(&nodes).unwrap();

        for (x, y) in queries {
            prop_assert_eq!(index.query_nearest(x, y), brute_force(&nodes, x, y));
        }
    }

    #[test]
    fn test_count_sum_includes_one_per_cell(
        cells in prop::collection::vec((0u32..5, 0u32..3), 0..200)
    ) {
        let assignments = assignments_from(&cells);
        let counts = count(
            &assignments,
            &[0, 1, 2, 3, 4],
            &[Label(0), Label(1), Label(2)],
            PseudoCount::Additive,
        ).unwrap();

        prop_assert_eq!(counts.total(), cells.len() as u64 + 5 * 3);
        prop_assert!(counts.counts.iter().all(|&c| c >= 1));
    }

    #[test]
    fn test_shuffle_preserves_label_multiset(
        cells in prop::collection::vec((0u32..4, 0u32..3), 1..200),
        seed in any::<u64>(),
        realization in 0usize..100
    ) {
        let assignments = assignments_from(&cells);
        let counter = LabelCounter::new(
            &assignments,
            &[0, 1, 2, 3],
            &[Label(0), Label(1), Label(2)],
            PseudoCount::None,
        ).unwrap();

        let mut before = counter.label_indices().to_vec();
        let mut after = PermutationTester::new(1, seed).shuffled_labels(&counter, realization);
        before.sort_unstable();
        after.sort_unstable();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn test_density_is_normalised(
        samples in prop::collection::vec(0.0f64..1.0, 1..500),
        grid in 2usize..200
    ) {
        let density = DensityEstimator::default()
            .estimate(&samples, &linspace(0.0, 1.0, grid))
            .unwrap();
        let total: f64 = density.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-6, "sum = {}", total);
    }
}
