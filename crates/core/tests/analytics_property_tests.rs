//! Property-based tests for the analytics core.
//!
//! These verify universal properties of the statistics, the percentile
//! scorer, and the simulator across randomly generated inputs, using the
//! `proptest` crate.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use fundlens_core::backtest::{PortfolioSimulator, RebalanceStrategy};
use fundlens_core::market_data::{AllocationTarget, NavPoint, NavSeries};
use fundlens_core::scoring::{quartile_for_rank, score_metric, MetricPolarity};
use fundlens_core::stats::{daily_returns, max_drawdown, sortino_ratio, volatility};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Weekly NAV series from a list of positive values.
fn weekly_series(values: &[f64]) -> NavSeries {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, &v)| {
            Decimal::from_f64(v).map(|nav| NavPoint {
                date: start_date() + Duration::days(7 * i as i64),
                nav: nav.round_dp(6),
            })
        })
        .collect()
}

fn arb_nav_values(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(1.0f64..10_000.0, 2..=max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A constant NAV series has zero volatility and zero drawdown.
    #[test]
    fn prop_constant_series_is_riskless(
        value in 1.0f64..10_000.0,
        len in 2usize..60,
    ) {
        let series = weekly_series(&vec![value; len]);
        prop_assert_eq!(volatility(&daily_returns(&series)), 0.0);
        prop_assert_eq!(max_drawdown(&series), 0.0);
    }

    /// A monotonically non-decreasing series never draws down.
    #[test]
    fn prop_monotonic_series_has_zero_drawdown(
        mut values in arb_nav_values(60),
    ) {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let series = weekly_series(&values);
        prop_assert_eq!(max_drawdown(&series), 0.0);
    }

    /// Sortino is invariant to uniformly scaling the NAV level, since it
    /// only depends on ratio returns.
    #[test]
    fn prop_ratios_are_scale_independent(
        values in arb_nav_values(40),
        scale in 1.5f64..50.0,
    ) {
        let base = weekly_series(&values);
        let scaled: Vec<f64> = values.iter().map(|v| v * scale).collect();
        let scaled = weekly_series(&scaled);
        let (rb, rs) = (daily_returns(&base), daily_returns(&scaled));
        prop_assert!((volatility(&rb) - volatility(&rs)).abs() < 1e-6);
        prop_assert!((sortino_ratio(&rb, 6.5) - sortino_ratio(&rs, 6.5)).abs() < 1e-6);
    }

    /// A larger value never scores below a smaller one when higher is
    /// better.
    #[test]
    fn prop_score_metric_is_monotonic(
        peers in proptest::collection::vec(-100.0f64..100.0, 1..50),
        a in -100.0f64..100.0,
        b in -100.0f64..100.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo_score = score_metric(lo, &peers, MetricPolarity::HigherIsBetter, 10.0);
        let hi_score = score_metric(hi, &peers, MetricPolarity::HigherIsBetter, 10.0);
        prop_assert!(hi_score >= lo_score);
    }

    /// The empty-peer default band applies regardless of the value.
    #[test]
    fn prop_empty_peers_always_default(
        value in -1_000.0f64..1_000.0,
        max_points in 1.0f64..40.0,
    ) {
        let score = score_metric(value, &[], MetricPolarity::HigherIsBetter, max_points);
        prop_assert!((score - 0.6 * max_points).abs() < 1e-12);
        let score = score_metric(value, &[], MetricPolarity::LowerIsBetter, max_points);
        prop_assert!((score - 0.6 * max_points).abs() < 1e-12);
    }

    /// Quartiles partition n ranks into groups of ceil(n/4), with the
    /// fourth absorbing the remainder, covering every rank exactly once.
    #[test]
    fn prop_quartiles_partition_exactly(n in 1usize..200) {
        let bucket = n.div_ceil(4);
        let mut counts = [0usize; 4];
        let mut last = 0u8;
        for rank in 1..=n {
            let quartile = quartile_for_rank(rank, n);
            prop_assert!((1..=4).contains(&quartile));
            // Quartile never decreases as rank worsens.
            prop_assert!(quartile >= last);
            last = quartile;
            counts[quartile as usize - 1] += 1;
        }
        prop_assert_eq!(counts.iter().sum::<usize>(), n);
        for (i, &count) in counts.iter().enumerate() {
            match i {
                3 => prop_assert!(count <= bucket),
                _ => prop_assert!(count == bucket || counts[i + 1..].iter().all(|&c| c == 0) && count <= bucket),
            }
        }
    }

    /// A single-fund, 100% allocation, no-rebalance run is exactly
    /// proportional to the fund's NAV trajectory.
    #[test]
    fn prop_single_fund_run_is_proportional(values in arb_nav_values(30)) {
        let series = weekly_series(&values);
        prop_assume!(series.len() == values.len());
        let start = start_date();
        let end = start + Duration::days(7 * (values.len() as i64 - 1));
        let nav0 = series.first().unwrap().nav;

        let mut nav_map = HashMap::new();
        nav_map.insert("solo-fund".to_string(), series.clone());
        let outcome = PortfolioSimulator::new(
            &[AllocationTarget {
                fund_id: "solo-fund".to_string(),
                target_weight: dec!(100),
            }],
            nav_map,
            dec!(1000),
            start,
            end,
            RebalanceStrategy::BuyAndHold,
        )
        .unwrap()
        .run()
        .unwrap();

        for point in &outcome.trajectory {
            let nav = series.resolve_nav(point.date).unwrap().nav;
            let expected = (dec!(1000) * nav / nav0).to_f64().unwrap();
            let actual = point.value.to_f64().unwrap();
            prop_assert!((actual - expected).abs() <= expected.abs() * 1e-9 + 1e-9);
        }
    }
}
