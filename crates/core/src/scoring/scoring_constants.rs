//! Fixed weight tables and thresholds for composite fund scoring.
//!
//! The point budgets and percentile bands are a design choice, not a
//! statistical necessity, and must be reproduced exactly so that scores
//! stay comparable across runs.

/// Minimum NAV points required before a fund can be scored.
pub const MIN_NAV_POINTS_FOR_SCORING: usize = 60;

/// Fraction of a sub-metric's budget awarded when no percentile can be
/// computed (empty peer population, or the fund's own metric unavailable).
/// This is the 50th-percentile band; the "no data" case is deliberately
/// neutral, never zero.
pub const DEFAULT_SCORE_FRACTION: f64 = 0.6;

/// A trailing return window with its point budget.
#[derive(Debug, Clone, Copy)]
pub struct ReturnWindow {
    pub label: &'static str,
    pub days: i64,
    pub max_points: f64,
    /// Windows of a year or more are annualized before comparison.
    pub annualized: bool,
}

/// Historical-returns component: 40 points across five windows.
pub const RETURN_WINDOWS: [ReturnWindow; 5] = [
    ReturnWindow { label: "3m", days: 90, max_points: 5.0, annualized: false },
    ReturnWindow { label: "6m", days: 180, max_points: 10.0, annualized: false },
    ReturnWindow { label: "1y", days: 365, max_points: 10.0, annualized: false },
    ReturnWindow { label: "3y", days: 1095, max_points: 8.0, annualized: true },
    ReturnWindow { label: "5y", days: 1825, max_points: 7.0, annualized: true },
];

pub const ONE_YEAR_DAYS: i64 = 365;
pub const THREE_YEAR_DAYS: i64 = 1095;

// Risk-grade component: 30 points.
pub const VOLATILITY_1Y_POINTS: f64 = 5.0;
pub const VOLATILITY_3Y_POINTS: f64 = 5.0;
pub const CAPTURE_1Y_POINTS: f64 = 8.0;
pub const CAPTURE_3Y_POINTS: f64 = 8.0;
pub const MAX_DRAWDOWN_POINTS: f64 = 4.0;

// Other-metrics component: 30 points.
pub const SECTOR_SIMILARITY_POINTS: f64 = 10.0;
pub const FORWARD_OUTLOOK_POINTS: f64 = 10.0;
pub const AUM_SIZE_POINTS: f64 = 5.0;
pub const EXPENSE_RATIO_POINTS: f64 = 5.0;

/// Quartile-2 funds at or above this total are HOLD, below are REVIEW.
pub const HOLD_MIN_SCORE: f64 = 65.0;
/// Quartile-3 funds at or above this total are REVIEW, below are SELL.
pub const REVIEW_MIN_SCORE: f64 = 50.0;

/// Benchmark index per fund category for capture-ratio scoring.
pub const CATEGORY_BENCHMARKS: &[(&str, &str)] = &[
    ("Equity", "NIFTY 50"),
    ("Debt", "NIFTY COMPOSITE DEBT"),
    ("Hybrid", "NIFTY 50"),
    ("ELSS", "NIFTY 500"),
];

pub const DEFAULT_BENCHMARK_INDEX: &str = "NIFTY 50";

/// Extra benchmark history fetched past the longest capture window so the
/// window start resolves to an at-or-before point.
pub const BENCHMARK_LOOKBACK_PAD_DAYS: i64 = 10;

/// Upper bound on concurrent fund scorings in a category batch, so a
/// category-wide pass cannot overwhelm the NAV data source.
pub const MAX_CONCURRENT_FUND_SCORINGS: usize = 8;

/// Returns the benchmark index name for a category.
pub fn category_benchmark(category: &str) -> &'static str {
    CATEGORY_BENCHMARKS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(category))
        .map(|(_, b)| *b)
        .unwrap_or(DEFAULT_BENCHMARK_INDEX)
}
