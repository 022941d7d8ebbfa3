//! End-to-end tests over the attribution and permutation pipeline

use community_label_analyzer::cluster::assignment::{assign, node_communities};
use community_label_analyzer::cluster::counts::count;
use community_label_analyzer::stats::density::linspace;
use community_label_analyzer::stats::significance::compare;
use community_label_analyzer::*;

fn corner_network() -> Vec<NetworkNode> {
    vec![
        NetworkNode::new(0, 0.0, 0.0, 1),
        NetworkNode::new(1, 10.0, 0.0, 1),
        NetworkNode::new(2, 0.0, 10.0, 2),
        NetworkNode::new(3, 10.0, 10.0, 2),
    ]
}

const A: Label = Label(1);
const B: Label = Label(2);

/// 100 observations: community 1 holds 40 A and 10 B, community 2 holds 5 A and 45 B
fn skewed_assignments() -> Vec<ClusterAssignment> {
    let mut layout = Vec::new();
    layout.extend(std::iter::repeat((1, A)).take(40));
    layout.extend(std::iter::repeat((1, B)).take(10));
    layout.extend(std::iter::repeat((2, A)).take(5));
    layout.extend(std::iter::repeat((2, B)).take(45));

    layout
        .into_iter()
        .enumerate()
        .map(|(id, (cluster_id, label))| ClusterAssignment {
            id: id as u32,
            x: id as f64,
            y: 0.0,
            label,
            cluster_id,
        })
        .collect()
}

#[test]
fn test_points_join_nearest_community() {
    let nodes = corner_network();
    let index = SpatialIndex::build(&nodes).unwrap();
    let points = [
        ObservationPoint::new(0, 1.0, 1.0, A),
        ObservationPoint::new(1, 9.0, 9.0, B),
    ];

    let assignments = assign(&points, &index, &node_communities(&nodes)).unwrap();

    assert_eq!(assignments[0].cluster_id, 1);
    assert_eq!(assignments[0].label, A);
    assert_eq!(assignments[1].cluster_id, 2);
    assert_eq!(assignments[1].label, B);
}

#[test]
fn test_null_mean_follows_label_marginal() {
    let assignments = skewed_assignments();
    let observed = count(&assignments, &[1, 2], &[A, B], PseudoCount::None).unwrap();
    assert_eq!(observed.counts, ndarray::arr2(&[[40u64, 10], [5, 45]]));

    let sample = PermutationTester::new(1000, 7)
        .run(&assignments, &[1, 2], &[A, B], PseudoCount::None)
        .unwrap();
    assert_eq!(sample.len(), 1000);

    // 50 observations in community 1, 45 of 100 labels are A
    let mean = sample.mean();
    assert!((mean[[0, 0]] - 22.5).abs() < 0.5, "mean = {}", mean[[0, 0]]);
    assert!((mean[[0, 1]] - 27.5).abs() < 0.5, "mean = {}", mean[[0, 1]]);
    assert!((mean[[1, 0]] - 22.5).abs() < 0.5, "mean = {}", mean[[1, 0]]);

    let comparison = compare(&observed, &sample, &DensityEstimator::default(), &linspace(0.0, 1.0, 100)).unwrap();
    let cell = comparison.cell(1, A).unwrap();
    assert!(cell.test.p_greater < 0.01);
    assert!(cell.test.p_two_sided < 0.01);
    assert!((cell.density.iter().sum::<f64>() - 1.0).abs() < 1e-6);
}

#[test]
fn test_null_mean_with_additive_pseudo_count() {
    let assignments = skewed_assignments();
    let sample = PermutationTester::new(1000, 3)
        .run(&assignments, &[1, 2], &[A, B], PseudoCount::Additive)
        .unwrap();

    let mean = sample.mean();
    assert!((mean[[0, 0]] - 23.5).abs() < 0.5, "mean = {}", mean[[0, 0]]);
    for r in 0..sample.len() {
        assert_eq!(sample.realization(r).total(), 100 + 2 * 2);
    }
}

#[test]
fn test_identical_seed_reproduces_sample() {
    let assignments = skewed_assignments();
    let run = |seed| {
        PermutationTester::new(200, seed)
            .run(&assignments, &[1, 2], &[A, B], PseudoCount::Additive)
            .unwrap()
    };
    assert_eq!(run(99), run(99));
}

#[test]
fn test_pipeline_end_to_end() {
    let nodes = corner_network();
    let points: Vec<ObservationPoint> = (0..40u32)
        .map(|id| {
            let (x, y, label) = if id < 20 { (1.0, 1.0, A) } else { (9.0, 9.0, B) };
            ObservationPoint::new(id, x + (id % 3) as f64 * 0.1, y, label)
        })
        .collect();

    let mut config = AnalysisConfig::default();
    config.realizations = 200;
    config.seed = 5;

    let output = community_label_analyzer::pipeline::run(&nodes, &points, None, &config).unwrap();

    assert_eq!(output.assignments.len(), points.len());
    assert_eq!(output.communities, vec![1, 2]);
    assert_eq!(output.labels, vec![A, B]);
    assert_eq!(output.observed.counts, ndarray::arr2(&[[21u64, 1], [1, 21]]));
    assert_eq!(output.observed.total(), 40 + 4);
    assert_eq!(output.sample.len(), 200);
    assert_eq!(output.comparison.cells.len(), 4);
    assert!(output.area_densities.is_none());
    assert!(output.comparison.cell(1, A).unwrap().test.p_greater < 0.05);

    let again = community_label_analyzer::pipeline::run(&nodes, &points, None, &config).unwrap();
    assert_eq!(output.sample, again.sample);
}

#[test]
fn test_pipeline_rejects_inconsistent_community_table() {
    let nodes = corner_network();
    let points = [ObservationPoint::new(0, 1.0, 1.0, A)];
    let mut config = AnalysisConfig::default();
    config.realizations = 0;

    let err = community_label_analyzer::pipeline::run(&nodes, &points, None, &config).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig { .. }));

    let err = community_label_analyzer::pipeline::run(&[], &points, None, &AnalysisConfig::default()).unwrap_err();
    assert_eq!(err, AnalysisError::EmptyIndex);
}

#[test]
fn test_save_results_writes_every_artifact() {
    let nodes = corner_network();
    let points = [
        ObservationPoint::new(0, 1.0, 1.0, A),
        ObservationPoint::new(1, 2.0, 1.0, B),
        ObservationPoint::new(2, 9.0, 9.0, B),
    ];
    let areas = [(1, 2.0), (2, 4.0)].into_iter().collect();

    let mut config = AnalysisConfig::default();
    config.realizations = 20;
    let output = community_label_analyzer::pipeline::run(&nodes, &points, Some(&areas), &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().to_str().unwrap();
    community_label_analyzer::storage::save_results(&output, &config, out).unwrap();

    for name in [
        "clusters.csv",
        "summary.json",
        "counts.json",
        "ratios.json",
        "null_counts.json",
        "comparison.json",
        "area_densities.json",
    ] {
        assert!(dir.path().join(name).exists(), "missing {}", name);
    }

    let csv = std::fs::read_to_string(dir.path().join("clusters.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("id,x,y,label,cluster"));
    assert_eq!(lines.count(), 3);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["observation_count"], 3);
    assert_eq!(summary["observations_per_community"], serde_json::json!([2, 1]));
}
