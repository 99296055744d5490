use super::percentile_scorer::{score_metric, MetricPolarity};
use super::scoring_constants::DEFAULT_SCORE_FRACTION;

#[test]
fn empty_peer_set_returns_default_band() {
    assert_eq!(
        score_metric(42.0, &[], MetricPolarity::HigherIsBetter, 10.0),
        DEFAULT_SCORE_FRACTION * 10.0
    );
    assert_eq!(
        score_metric(-5.0, &[], MetricPolarity::LowerIsBetter, 10.0),
        DEFAULT_SCORE_FRACTION * 10.0
    );
}

#[test]
fn top_of_distribution_gets_full_budget() {
    let peers: Vec<f64> = (0..10).map(|i| i as f64).collect();
    assert_eq!(
        score_metric(100.0, &peers, MetricPolarity::HigherIsBetter, 10.0),
        10.0
    );
}

#[test]
fn bottom_of_distribution_gets_bottom_band() {
    let peers: Vec<f64> = (0..10).map(|i| i as f64).collect();
    assert_eq!(
        score_metric(-1.0, &peers, MetricPolarity::HigherIsBetter, 10.0),
        2.0
    );
}

#[test]
fn band_boundaries_are_inclusive() {
    // 10 peers: beating exactly 9 of 10 = 90th percentile = full budget.
    let peers: Vec<f64> = (0..10).map(|i| i as f64).collect();
    assert_eq!(
        score_metric(8.5, &peers, MetricPolarity::HigherIsBetter, 10.0),
        10.0
    );
    // Beating 5 of 10 = 50th percentile band.
    assert_eq!(
        score_metric(4.5, &peers, MetricPolarity::HigherIsBetter, 10.0),
        6.0
    );
    // Beating 2 of 10 = 20th percentile, below the 25th band.
    assert_eq!(
        score_metric(1.5, &peers, MetricPolarity::HigherIsBetter, 10.0),
        2.0
    );
}

#[test]
fn lower_is_better_counts_peers_above() {
    let peers = vec![1.0, 2.0, 3.0, 4.0];
    // Expense of 0.5 beats all four peers.
    assert_eq!(
        score_metric(0.5, &peers, MetricPolarity::LowerIsBetter, 5.0),
        5.0
    );
    assert_eq!(
        score_metric(5.0, &peers, MetricPolarity::LowerIsBetter, 5.0),
        1.0
    );
}

#[test]
fn higher_is_better_is_monotonic() {
    let peers = vec![1.0, 3.0, 5.0, 7.0, 9.0];
    let mut last = f64::MIN;
    for value in [0.0, 2.0, 4.0, 6.0, 8.0, 10.0] {
        let score = score_metric(value, &peers, MetricPolarity::HigherIsBetter, 10.0);
        assert!(score >= last, "score dropped at value {value}");
        last = score;
    }
}
