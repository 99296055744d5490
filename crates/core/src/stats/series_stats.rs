//! Pure return/risk statistics over NAV series and daily-return sequences.
//!
//! All functions are side-effect free and never perform I/O; callers fetch
//! the series first and pass snapshots in. Return-like values are percent,
//! daily returns and drawdowns are fractions.

use chrono::{Duration, NaiveDate};
use num_traits::ToPrimitive;

use crate::constants::{
    DAYS_PER_YEAR, SORTINO_NO_DOWNSIDE, TRADING_DAYS_PER_YEAR,
};
use crate::market_data::NavSeries;

/// Benchmark direction a capture ratio is conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDirection {
    Up,
    Down,
}

/// Percentage return over a trailing window ending at `as_of`.
///
/// Both endpoints resolve to the nearest NAV at or before the target date.
/// `None` when the series does not reach back far enough to cover the
/// window; callers must treat `None` as "metric unavailable", never as zero.
pub fn point_return(series: &NavSeries, window_days: i64, as_of: NaiveDate) -> Option<f64> {
    let end = series.nav_at_or_before(as_of)?;
    let start = series.nav_at_or_before(as_of - Duration::days(window_days))?;
    let ratio = (end.nav / start.nav).to_f64()?;
    Some((ratio - 1.0) * 100.0)
}

/// Annualized percentage return over a trailing window, for windows of a
/// year or more. Same endpoint lookup and insufficiency rule as
/// [`point_return`].
pub fn annualized_return(series: &NavSeries, window_days: i64, as_of: NaiveDate) -> Option<f64> {
    let end = series.nav_at_or_before(as_of)?;
    let start = series.nav_at_or_before(as_of - Duration::days(window_days))?;
    let ratio = (end.nav / start.nav).to_f64()?;
    Some((ratio.powf(DAYS_PER_YEAR / window_days as f64) - 1.0) * 100.0)
}

/// Chronological ratio-minus-one between consecutive NAV points, as
/// fractions. Length is one less than the series length.
pub fn daily_returns(series: &NavSeries) -> Vec<f64> {
    let values = series.values_f64();
    daily_returns_from_values(&values)
}

/// Daily returns over an already-extracted value sequence.
pub fn daily_returns_from_values(values: &[f64]) -> Vec<f64> {
    if values.len() < 2 {
        return Vec::new();
    }
    values
        .windows(2)
        .filter_map(|w| {
            if w[0] != 0.0 {
                Some(w[1] / w[0] - 1.0)
            } else {
                None
            }
        })
        .collect()
}

/// Annualized volatility in percent: sample standard deviation of daily
/// returns scaled by sqrt(252). Zero for fewer than two observations.
pub fn volatility(daily_returns: &[f64]) -> f64 {
    let n = daily_returns.len();
    if n < 2 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = daily_returns.iter().sum::<f64>() / nf;
    let variance = daily_returns
        .iter()
        .map(|r| (r - mean).powi(2))
        .sum::<f64>()
        / (nf - 1.0);
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// Largest peak-to-trough fractional decline, scanned chronologically with
/// the peak reset at every new high. Zero for series shorter than two points.
pub fn max_drawdown(series: &NavSeries) -> f64 {
    max_drawdown_from_values(&series.values_f64())
}

/// Max drawdown over an already-extracted value sequence.
pub fn max_drawdown_from_values(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mut peak = values[0];
    let mut max_dd = 0.0_f64;
    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (peak - v) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Excess return over the risk-free rate per unit of volatility. All three
/// inputs are annualized percent values. Zero when volatility is zero.
pub fn sharpe_ratio(annualized_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility == 0.0 {
        return 0.0;
    }
    (annualized_return - risk_free_rate) / volatility
}

/// Like Sharpe, but the denominator is the downside deviation computed only
/// from daily returns below the daily risk-free rate. When no sub-threshold
/// returns exist the ratio is reported as maximally favorable.
pub fn sortino_ratio(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    if daily_returns.is_empty() {
        return 0.0;
    }
    let daily_rf = risk_free_rate / 100.0 / TRADING_DAYS_PER_YEAR;
    let nf = daily_returns.len() as f64;
    let mean = daily_returns.iter().sum::<f64>() / nf;

    let downside: Vec<f64> = daily_returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|r| (r - daily_rf).powi(2))
        .collect();
    if downside.is_empty() {
        return SORTINO_NO_DOWNSIDE;
    }
    let downside_dev = (downside.iter().sum::<f64>() / nf).sqrt();
    if downside_dev < 1e-12 {
        return SORTINO_NO_DOWNSIDE;
    }
    ((mean - daily_rf) / downside_dev) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Average fund return over days where the benchmark moved in `direction`,
/// divided by the average benchmark return over those days, times 100.
/// Zero when no qualifying days exist.
pub fn capture_ratio(
    fund_daily_returns: &[f64],
    benchmark_daily_returns: &[f64],
    direction: CaptureDirection,
) -> f64 {
    let n = fund_daily_returns.len().min(benchmark_daily_returns.len());
    let mut fund_sum = 0.0;
    let mut bench_sum = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        let b = benchmark_daily_returns[i];
        let qualifies = match direction {
            CaptureDirection::Up => b > 0.0,
            CaptureDirection::Down => b < 0.0,
        };
        if qualifies {
            fund_sum += fund_daily_returns[i];
            bench_sum += b;
            count += 1;
        }
    }
    if count == 0 || bench_sum == 0.0 {
        return 0.0;
    }
    let fund_avg = fund_sum / count as f64;
    let bench_avg = bench_sum / count as f64;
    (fund_avg / bench_avg) * 100.0
}

/// Daily returns for two series restricted to the dates both have a point
/// on. Capture ratios and tracking error compare day-by-day moves, so the
/// two return sequences must come from a common date grid.
pub fn aligned_daily_returns(a: &NavSeries, b: &NavSeries) -> (Vec<f64>, Vec<f64>) {
    let b_by_date: std::collections::HashMap<NaiveDate, f64> = b
        .iter()
        .filter_map(|p| p.nav.to_f64().map(|v| (p.date, v)))
        .collect();
    let mut a_vals = Vec::new();
    let mut b_vals = Vec::new();
    for p in a.iter() {
        if let (Some(av), Some(&bv)) = (p.nav.to_f64(), b_by_date.get(&p.date)) {
            a_vals.push(av);
            b_vals.push(bv);
        }
    }
    (
        daily_returns_from_values(&a_vals),
        daily_returns_from_values(&b_vals),
    )
}

/// Annualized standard deviation, in percent, of fund-minus-benchmark daily
/// return differences.
pub fn tracking_error(fund_daily_returns: &[f64], benchmark_daily_returns: &[f64]) -> f64 {
    let n = fund_daily_returns.len().min(benchmark_daily_returns.len());
    if n < 2 {
        return 0.0;
    }
    let diffs: Vec<f64> = (0..n)
        .map(|i| fund_daily_returns[i] - benchmark_daily_returns[i])
        .collect();
    volatility(&diffs)
}
