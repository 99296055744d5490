//! Backtest request, strategy, and result models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market_data::AllocationTarget;

/// Calendar rebalancing cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RebalanceFrequency {
    Monthly,
    Quarterly,
    Annually,
}

impl RebalanceFrequency {
    pub fn months(&self) -> u32 {
        match self {
            RebalanceFrequency::Monthly => 1,
            RebalanceFrequency::Quarterly => 3,
            RebalanceFrequency::Annually => 12,
        }
    }
}

/// How holdings drift back to their target weights during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RebalanceStrategy {
    /// Initial units are held untouched to the end date.
    BuyAndHold,
    /// Units reset to target weights on a periodic schedule.
    Calendar(RebalanceFrequency),
    /// Units reset whenever any fund's weight drifts more than
    /// `deviation_percent` percentage points from target. Evaluated daily.
    Threshold { deviation_percent: f64 },
}

/// A historical simulation request. Allocations resolve in order: explicit
/// targets, then the named portfolio, then the risk profile (with the
/// built-in default table as a last resort).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub portfolio_id: Option<String>,
    pub risk_profile: Option<String>,
    pub allocations: Option<Vec<AllocationTarget>>,
    pub initial_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub strategy: RebalanceStrategy,
    /// Market index for the comparison trajectory. Comparison is omitted
    /// when the index has no data over the window.
    pub benchmark_index: Option<String>,
}

/// A synthetic shock-and-recovery simulation: NAVs decline linearly over
/// the shock window and recover linearly afterwards, starting from each
/// fund's most recent published NAV.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressTestRequest {
    pub risk_profile: Option<String>,
    pub allocations: Option<Vec<AllocationTarget>>,
    pub initial_amount: Decimal,
    /// Peak decline in percent, e.g. 30 for a 30% crash.
    pub shock_percent: f64,
    pub shock_duration_days: i64,
    pub recovery_days: i64,
}

/// One sampled portfolio (or benchmark) value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Raw output of one simulator run, before benchmark comparison and
/// request metadata are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub trajectory: Vec<TrajectoryPoint>,
    pub final_value: Decimal,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub rebalance_count: usize,
}

/// Immutable result of one backtest invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub benchmark_index: Option<String>,
    pub benchmark_return: Option<f64>,
    pub value_trajectory: Vec<TrajectoryPoint>,
    pub benchmark_trajectory: Option<Vec<TrajectoryPoint>>,
    pub calculated_at: DateTime<Utc>,
}
