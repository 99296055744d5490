//! Percentile-band scoring of one metric value against a peer distribution.

use super::scoring_constants::DEFAULT_SCORE_FRACTION;

/// Whether a larger or smaller metric value is the favorable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPolarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Percentile thresholds and the fraction of the point budget each band
/// awards. Scanned top down; the first band whose threshold the percentile
/// reaches wins.
const PERCENTILE_BANDS: [(f64, f64); 4] = [
    (90.0, 1.0),
    (75.0, 0.8),
    (50.0, 0.6),
    (25.0, 0.4),
];

/// Fraction awarded below the lowest band threshold.
const BOTTOM_BAND_FRACTION: f64 = 0.2;

/// Scores `value` against `peer_values` under `polarity`, awarding a banded
/// fraction of `max_points`.
///
/// The percentile is the share of peers strictly worse than `value`. An
/// empty peer population returns the documented 50th-percentile default
/// band rather than a fault.
pub fn score_metric(
    value: f64,
    peer_values: &[f64],
    polarity: MetricPolarity,
    max_points: f64,
) -> f64 {
    if peer_values.is_empty() {
        return DEFAULT_SCORE_FRACTION * max_points;
    }
    let worse = peer_values
        .iter()
        .filter(|&&peer| match polarity {
            MetricPolarity::HigherIsBetter => peer < value,
            MetricPolarity::LowerIsBetter => peer > value,
        })
        .count();
    let percentile = worse as f64 / peer_values.len() as f64 * 100.0;
    let fraction = PERCENTILE_BANDS
        .iter()
        .find(|(threshold, _)| percentile >= *threshold)
        .map(|(_, fraction)| *fraction)
        .unwrap_or(BOTTOM_BAND_FRACTION);
    fraction * max_points
}
