//! End-to-end tests for the full cohort pipeline.
//!
//! rows → GraphCatalog → MetricsCatalog → ComparisonReport

use cohesion::pipeline::{build_graph_catalog, compute_metrics_catalog, recordings_from_rows};
use cohesion::{
    AnalysisConfig, Band, CatalogKey, ComparisonOutcome, Error, GlobalMetric, MetricId,
    MetricsEngine, NodeMetric, Recording, SignificanceEngine, State, TestKind,
};
use pretty_assertions::assert_eq;

const SUBJECTS: [&str; 5] = ["01", "02", "03", "04", "05"];

// ============================================================================
// Helpers
// ============================================================================

/// Fully specified row for `n` sites, weights derived from `seed`.
fn synthetic_row(subject: &str, band: &str, n: usize, seed: usize) -> Vec<String> {
    let mut row = vec![subject.to_string(), band.to_string()];
    for i in 1..n {
        for j in (i + 1)..=n {
            let w = ((i * 7 + j * 13 + seed * 31) % 97) as f64 / 100.0;
            row.push(format!("{w:.2}"));
        }
        row.push("1.0".into());
    }
    row.push("1.0".into());
    row
}

/// Delta rows identical in both states; theta film rows hold a single edge.
fn cohort() -> Vec<Recording> {
    let mut recordings = Vec::new();
    for (seed, subject) in SUBJECTS.iter().enumerate() {
        let delta = synthetic_row(subject, "delta", 6, seed);
        let theta = synthetic_row(subject, "theta", 6, seed + 10);
        let theta_film = vec![subject.to_string(), "theta".into(), "0.5".into(), "1.0".into()];

        recordings.extend(
            recordings_from_rows(subject, State::Rest, vec![delta.clone(), theta]).unwrap(),
        );
        recordings.extend(
            recordings_from_rows(subject, State::Film, vec![delta, theta_film]).unwrap(),
        );
    }
    recordings
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        threshold_fraction: 0.3,
        bands: vec![Band::Delta, Band::Theta],
        ..Default::default()
    }
}

// ============================================================================
// 1. Graph catalog
// ============================================================================

#[test]
fn test_graph_catalog_covers_every_recording() {
    let batch = build_graph_catalog(&cohort(), &config()).unwrap();
    assert!(batch.failures.is_empty());
    assert_eq!(batch.catalog.len(), SUBJECTS.len() * 4);

    // 15 candidate edges, floor(15 × 0.3) = 4 kept.
    let g = batch.catalog.get(&CatalogKey::new("01", State::Rest, Band::Delta)).unwrap();
    assert_eq!(g.edge_count(), 4);

    // One candidate edge, floor(0.3) = 0 kept.
    let g = batch.catalog.get(&CatalogKey::new("01", State::Film, Band::Theta)).unwrap();
    assert!(g.is_empty());
}

#[test]
fn test_catalog_order_follows_input() {
    let recordings = cohort();
    let batch = build_graph_catalog(&recordings, &config()).unwrap();
    let expected: Vec<CatalogKey> = recordings.iter().map(Recording::key).collect();
    assert_eq!(batch.catalog.keys(), expected);

    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    assert_eq!(metrics.keys(), expected);
}

#[test]
fn test_identical_states_yield_identical_metrics() {
    let batch = build_graph_catalog(&cohort(), &config()).unwrap();
    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    for subject in SUBJECTS {
        let rest = metrics.get(&CatalogKey::new(subject, State::Rest, Band::Delta)).unwrap();
        let film = metrics.get(&CatalogKey::new(subject, State::Film, Band::Delta)).unwrap();
        assert_eq!(rest, film);
    }
}

// ============================================================================
// 2. Significance
// ============================================================================

#[test]
fn test_identical_states_are_not_significant() {
    let batch = build_graph_catalog(&cohort(), &config()).unwrap();
    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    let engine = SignificanceEngine::new(&metrics);

    for metric in [GlobalMetric::NodeCount, GlobalMetric::EdgeCount, GlobalMetric::Density] {
        let r = engine
            .compare_global(metric, State::Rest, State::Film, Band::Delta, 0.05)
            .unwrap();
        assert_eq!(r.test, TestKind::PairedT);
        assert_eq!(r.statistic, 0.0);
        assert_eq!(r.p_value, 1.0);
        assert!(!r.significant);
        assert_eq!(r.n_1, SUBJECTS.len());
    }

    let r = engine
        .compare_node(NodeMetric::DegreeCentrality, State::Rest, State::Film, Band::Delta, 0.05)
        .unwrap();
    assert_eq!(r.test, TestKind::KolmogorovSmirnov);
    assert_eq!(r.statistic, 0.0);
    assert!(!r.significant);
    assert_eq!(r.n_1, r.n_2);
}

#[test]
fn test_empty_pooled_sample_is_insufficient() {
    let batch = build_graph_catalog(&cohort(), &config()).unwrap();
    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    let err = SignificanceEngine::new(&metrics)
        .compare_node(NodeMetric::ClusteringCoefficient, State::Rest, State::Film, Band::Theta, 0.05)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
}

#[test]
fn test_compare_all_reports_every_pair() {
    let config = config();
    let batch = build_graph_catalog(&cohort(), &config).unwrap();
    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    let report = SignificanceEngine::new(&metrics)
        .compare_all(config.baseline_state, config.contrast_state, &config.bands, config.alpha)
        .unwrap();

    assert_eq!(report.len(), 2 * MetricId::all().count());
    assert_eq!(report.tested_count() + report.skipped_count(), report.len());
    assert_eq!(report.significant().filter(|r| r.band == Band::Delta).count(), 0);

    // Bands in requested order, metrics in registry order.
    let order: Vec<(Band, MetricId)> = report.iter().map(|(pair, _)| pair).collect();
    let expected: Vec<(Band, MetricId)> = [Band::Delta, Band::Theta]
        .into_iter()
        .flat_map(|b| MetricId::all().map(move |m| (b, m)))
        .collect();
    assert_eq!(order, expected);

    // Empty film graphs leave nothing to pool.
    for metric in NodeMetric::ALL {
        let outcome = report.get(Band::Theta, MetricId::Node(metric)).unwrap();
        assert!(matches!(outcome, ComparisonOutcome::Skipped { .. }));
    }
    let outcome = report.get(Band::Delta, MetricId::Node(NodeMetric::DegreeCentrality)).unwrap();
    assert!(outcome.record().is_some());

    // Film theta graphs have zero nodes, rest theta graphs do not.
    let r = report
        .get(Band::Theta, MetricId::Global(GlobalMetric::NodeCount))
        .and_then(ComparisonOutcome::record)
        .unwrap();
    assert_eq!(r.n_1, SUBJECTS.len());
    assert!(r.statistic > 0.0);
}

#[test]
fn test_report_serializes_to_json() {
    let config = config();
    let batch = build_graph_catalog(&cohort(), &config).unwrap();
    let metrics = compute_metrics_catalog(&batch.catalog, &MetricsEngine::new());
    let report = SignificanceEngine::new(&metrics)
        .compare_all(State::Rest, State::Film, &[Band::Theta], 0.05)
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state_1"], "rest");
    assert_eq!(json["entries"].as_array().unwrap().len(), report.len());
    assert!(json["entries"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["outcome"]["status"] == "skipped"));
}
