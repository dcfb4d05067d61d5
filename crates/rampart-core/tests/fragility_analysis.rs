//! Sequential node removal and reporting on the canonical fixtures

use assert_matches::assert_matches;
use rampart_core::{
    ascending_importance_order, check_critical_threshold, AnalysisConfig, ComponentId,
    FragilityAnalyzer, ReliabilityEvaluator, ReliabilityReport, ResilienceError,
};
use rampart_testkit::{complete_network, init_test_tracing, sample_network, star_network};

fn ids(names: &[&str]) -> Vec<ComponentId> {
    names.iter().map(|n| ComponentId::new(*n)).collect()
}

#[test]
fn test_removal_halts_at_critical_threshold() {
    init_test_tracing();
    let network = complete_network(5);
    let evaluator =
        ReliabilityEvaluator::new(AnalysisConfig::default().with_critical_threshold(3)).unwrap();
    let mut analyzer =
        FragilityAnalyzer::new(evaluator, &network, network.node_probabilities()).unwrap();

    assert_eq!(analyzer.remove(&ComponentId::new("n0")).unwrap().remaining_nodes, 4);
    assert_eq!(analyzer.remove(&ComponentId::new("n1")).unwrap().remaining_nodes, 3);
    assert_matches!(
        analyzer.remove(&ComponentId::new("n2")),
        Err(ResilienceError::CriticalThresholdReached { remaining: 2, threshold: 3 })
    );
    assert!(analyzer.is_halted());
    assert_eq!(analyzer.network().node_count(), 3);

    let counts: Vec<usize> = analyzer.snapshots().iter().map(|s| s.remaining_nodes).collect();
    assert_eq!(counts, vec![5, 4, 3]);
    assert!(analyzer.snapshots().iter().all(|s| s.connected));
}

#[test]
fn test_run_reports_refused_tail() {
    let network = complete_network(5);
    let analyzer = FragilityAnalyzer::new(
        ReliabilityEvaluator::default(),
        &network,
        network.node_probabilities(),
    )
    .unwrap();
    let report = analyzer.run(&ids(&["n4", "n3", "n2", "n1"])).unwrap();

    assert!(report.critical_threshold_reached);
    assert_eq!(report.snapshots.len(), 3);
    assert_eq!(report.refused, ids(&["n2", "n1"]));
    assert_eq!(report.last().unwrap().removed, Some(ComponentId::new("n3")));

    let trend = report.reliability_trend();
    // fewer redundant survivors can only lower reliability on a complete graph
    assert!(trend.windows(2).all(|w| w[1] <= w[0] + 1e-12));
}

#[test]
fn test_unknown_node_aborts_run_without_halting() {
    let network = star_network(4);
    let mut analyzer = FragilityAnalyzer::new(
        ReliabilityEvaluator::default(),
        &network,
        network.node_probabilities(),
    )
    .unwrap();
    assert_matches!(
        analyzer.remove(&ComponentId::new("ghost")),
        Err(ResilienceError::UnknownComponent { .. })
    );
    assert!(!analyzer.is_halted());

    let snapshot = analyzer.remove(&ComponentId::new("hub")).unwrap();
    assert!(!snapshot.connected);
    assert_eq!(snapshot.component_count, 4);
    assert_eq!(snapshot.reliability, 0.0);
}

#[test]
fn test_least_important_first_on_sample_network() {
    let network = sample_network();
    let evaluator = ReliabilityEvaluator::default();
    let order =
        ascending_importance_order(&evaluator, &network, &network.node_probabilities()).unwrap();
    assert_eq!(order.len(), 6);

    let status = check_critical_threshold(&network, 3);
    assert!(!status.reached);
    assert_eq!(status.node_count, 6);

    let report = FragilityAnalyzer::new(evaluator, &network, network.node_probabilities())
        .unwrap()
        .run(&order)
        .unwrap();
    assert_eq!(report.snapshots.len(), 4);
    assert_eq!(report.refused.len(), 3);
    assert_eq!(report.snapshots[0].removed, None);
}

#[test]
fn test_sample_network_report() {
    let network = sample_network();
    let evaluator = ReliabilityEvaluator::default();
    let mut report =
        ReliabilityReport::build(&evaluator, &network, &network.node_probabilities()).unwrap();

    let expected = evaluator
        .evaluate(&network, &network.node_probabilities())
        .unwrap();
    assert_eq!(report.network, "sample");
    assert_eq!(report.system.reliability, expected);
    assert!(report.system.reliability > 0.0 && report.system.reliability < 1.0);
    assert_eq!(report.system.node_count, 6);
    assert_eq!(report.system.link_count, 5);
    assert!(report.system.connected);

    let router = report.row(&ComponentId::new("router1")).unwrap();
    assert_eq!(router.degree, 3);
    assert!((router.failure_probability - 0.05).abs() < 1e-12);

    report.sort_by_importance();
    let coefficients: Vec<f64> = report.nodes.iter().map(|r| r.birnbaum).collect();
    assert!(coefficients.windows(2).all(|w| w[0] >= w[1]));

    let json = serde_json::to_string(&report).unwrap();
    let decoded: ReliabilityReport = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, report);
}
