use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::backtest_model::{RebalanceFrequency, RebalanceStrategy};
use super::portfolio_simulator::PortfolioSimulator;
use crate::errors::Error;
use crate::market_data::{AllocationTarget, NavPoint, NavSeries};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// NAV points spaced one week apart, matching the key-date sampling grid.
fn weekly_series(start: NaiveDate, navs: &[Decimal]) -> NavSeries {
    navs.iter()
        .enumerate()
        .map(|(i, &nav)| NavPoint {
            date: start + Duration::days(7 * i as i64),
            nav,
        })
        .collect()
}

fn allocation(fund_id: &str, weight: Decimal) -> AllocationTarget {
    AllocationTarget {
        fund_id: fund_id.to_string(),
        target_weight: weight,
    }
}

fn single_fund_sim(
    navs: &[Decimal],
    strategy: RebalanceStrategy,
) -> PortfolioSimulator {
    let start = d(2024, 1, 1);
    let end = start + Duration::days(7 * (navs.len() as i64 - 1));
    let mut series = HashMap::new();
    series.insert("growth-fund".to_string(), weekly_series(start, navs));
    PortfolioSimulator::new(
        &[allocation("growth-fund", dec!(100))],
        series,
        dec!(1000),
        start,
        end,
        strategy,
    )
    .unwrap()
}

#[test]
fn single_fund_trajectory_is_proportional_to_nav() {
    // NAVs 100 -> 110 -> 99 -> 121 with a 100% single-fund allocation.
    let outcome = single_fund_sim(
        &[dec!(100), dec!(110), dec!(99), dec!(121)],
        RebalanceStrategy::BuyAndHold,
    )
    .run()
    .unwrap();

    let values: Vec<Decimal> = outcome.trajectory.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![dec!(1000), dec!(1100), dec!(990), dec!(1210)]);
    assert!((outcome.total_return - 21.0).abs() < 1e-9);
    // Peak 1100, trough 990.
    assert!((outcome.max_drawdown - 0.1).abs() < 1e-9);
    assert_eq!(outcome.final_value, dec!(1210));
    assert_eq!(outcome.rebalance_count, 0);
}

#[test]
fn constant_nav_has_zero_volatility_and_drawdown() {
    let outcome = single_fund_sim(
        &[dec!(50); 8],
        RebalanceStrategy::BuyAndHold,
    )
    .run()
    .unwrap();
    assert_eq!(outcome.volatility, 0.0);
    assert_eq!(outcome.max_drawdown, 0.0);
    assert!((outcome.total_return - 0.0).abs() < 1e-9);
}

#[test]
fn invalid_date_range_is_rejected() {
    let mut series = HashMap::new();
    series.insert(
        "growth-fund".to_string(),
        weekly_series(d(2024, 1, 1), &[dec!(100), dec!(101)]),
    );
    let err = PortfolioSimulator::new(
        &[allocation("growth-fund", dec!(100))],
        series,
        dec!(1000),
        d(2024, 2, 1),
        d(2024, 1, 1),
        RebalanceStrategy::BuyAndHold,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidDateRange { .. }));
}

#[test]
fn missing_start_nav_is_fatal() {
    let mut series = HashMap::new();
    series.insert(
        "growth-fund".to_string(),
        weekly_series(d(2024, 1, 1), &[dec!(100), dec!(101)]),
    );
    series.insert("ghost-fund".to_string(), NavSeries::default());
    let err = PortfolioSimulator::new(
        &[
            allocation("growth-fund", dec!(50)),
            allocation("ghost-fund", dec!(50)),
        ],
        series,
        dec!(1000),
        d(2024, 1, 1),
        d(2024, 1, 8),
        RebalanceStrategy::BuyAndHold,
    )
    .unwrap_err();
    match err {
        Error::NoInitialNav { fund_id, .. } => assert_eq!(fund_id, "ghost-fund"),
        other => panic!("expected NoInitialNav, got {other}"),
    }
}

#[test]
fn quarterly_rebalance_resets_drifted_weights() {
    // Fund A stays flat at 100; fund B gains 20% over the first quarter
    // and another 10% over the second.
    let start = d(2024, 1, 1);
    let end = d(2024, 7, 1);
    let mut series = HashMap::new();
    series.insert(
        "steady-fund".to_string(),
        NavSeries::new(vec![NavPoint { date: start, nav: dec!(100) }]),
    );
    series.insert(
        "runner-fund".to_string(),
        NavSeries::new(vec![
            NavPoint { date: start, nav: dec!(100) },
            NavPoint { date: d(2024, 4, 1), nav: dec!(120) },
            NavPoint { date: end, nav: dec!(132) },
        ]),
    );
    let allocations = [
        allocation("steady-fund", dec!(50)),
        allocation("runner-fund", dec!(50)),
    ];

    let held = PortfolioSimulator::new(
        &allocations,
        series.clone(),
        dec!(1000),
        start,
        end,
        RebalanceStrategy::BuyAndHold,
    )
    .unwrap()
    .run()
    .unwrap();
    // Unrebalanced: 5 units each, 5 * 100 + 5 * 132.
    assert!((held.final_value.to_f64().unwrap() - 1160.0).abs() < 1e-6);

    let rebalanced = PortfolioSimulator::new(
        &allocations,
        series,
        dec!(1000),
        start,
        end,
        RebalanceStrategy::Calendar(RebalanceFrequency::Quarterly),
    )
    .unwrap()
    .run()
    .unwrap();

    // At the April rebalance the 500/600 split resets to 550/550, so the
    // runner's second-quarter gain compounds from exactly half the book:
    // 550 + 550 * 1.1.
    assert_eq!(rebalanced.rebalance_count, 2);
    let april = rebalanced
        .trajectory
        .iter()
        .find(|p| p.date == d(2024, 4, 1))
        .expect("rebalance date is always evaluated");
    assert!((april.value.to_f64().unwrap() - 1100.0).abs() < 1e-6);
    assert!((rebalanced.final_value.to_f64().unwrap() - 1155.0).abs() < 1e-6);
}

#[test]
fn threshold_mode_evaluates_daily_and_triggers_on_drift() {
    let start = d(2024, 1, 1);
    let end = d(2024, 1, 31);
    let mut series = HashMap::new();
    series.insert(
        "steady-fund".to_string(),
        NavSeries::new(vec![NavPoint { date: start, nav: dec!(100) }]),
    );
    series.insert(
        "runner-fund".to_string(),
        NavSeries::new(vec![
            NavPoint { date: start, nav: dec!(100) },
            NavPoint { date: d(2024, 1, 10), nav: dec!(130) },
        ]),
    );

    let outcome = PortfolioSimulator::new(
        &[
            allocation("steady-fund", dec!(50)),
            allocation("runner-fund", dec!(50)),
        ],
        series,
        dec!(1000),
        start,
        end,
        RebalanceStrategy::Threshold { deviation_percent: 5.0 },
    )
    .unwrap()
    .run()
    .unwrap();

    // Every calendar day is evaluated, not just weekly key dates.
    assert_eq!(outcome.trajectory.len(), 31);
    // The jump to 130 pushes the runner to ~56.5% of the book, beyond the
    // 5-point band; one reset brings it back and no further drift occurs.
    assert_eq!(outcome.rebalance_count, 1);
    assert!((outcome.final_value.to_f64().unwrap() - 1150.0).abs() < 1e-6);
}

#[test]
fn weights_normalize_against_supplied_sum() {
    let start = d(2024, 1, 1);
    let end = d(2024, 1, 15);
    let mut series = HashMap::new();
    series.insert(
        "steady-fund".to_string(),
        weekly_series(start, &[dec!(100), dec!(100), dec!(100)]),
    );
    series.insert(
        "runner-fund".to_string(),
        weekly_series(start, &[dec!(100), dec!(110), dec!(120)]),
    );

    // 60/60 normalizes to the same book as 50/50.
    let lopsided = PortfolioSimulator::new(
        &[
            allocation("steady-fund", dec!(60)),
            allocation("runner-fund", dec!(60)),
        ],
        series.clone(),
        dec!(1000),
        start,
        end,
        RebalanceStrategy::BuyAndHold,
    )
    .unwrap()
    .run()
    .unwrap();
    let even = PortfolioSimulator::new(
        &[
            allocation("steady-fund", dec!(50)),
            allocation("runner-fund", dec!(50)),
        ],
        series,
        dec!(1000),
        start,
        end,
        RebalanceStrategy::BuyAndHold,
    )
    .unwrap()
    .run()
    .unwrap();
    assert_eq!(lopsided.final_value, even.final_value);
}
