//! Time-stepped portfolio simulation over prefetched NAV histories.
//!
//! A run is strictly sequential along the time axis: holdings at one
//! evaluation date depend on the previous date's rebalancing decision, so
//! one run owns its state exclusively and never shares it across tasks.
//! All NAV data is prefetched by the caller; the simulator performs no I/O.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, warn};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::backtest_constants::{KEY_DATE_INTERVAL_DAYS, REBALANCE_DATE_TOLERANCE_DAYS};
use super::backtest_model::{RebalanceStrategy, SimulationOutcome, TrajectoryPoint};
use crate::constants::DEFAULT_RISK_FREE_RATE;
use crate::errors::{Error, Result};
use crate::market_data::{AllocationTarget, NavSeries};
use crate::stats::{daily_returns_from_values, sharpe_ratio, volatility};
use crate::utils::time_utils::{add_months, get_days_between, periodic_dates, years_between};

/// Unit holdings for one fund, owned by one in-progress run. Reset at each
/// rebalance event and discarded at completion.
#[derive(Debug, Clone)]
struct HoldingState {
    fund_id: String,
    units: Decimal,
    /// Normalized target weight as a fraction of 1.
    target_weight: Decimal,
}

#[derive(Debug)]
pub struct PortfolioSimulator {
    holdings: Vec<HoldingState>,
    nav_series: HashMap<String, NavSeries>,
    initial_amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    strategy: RebalanceStrategy,
}

impl PortfolioSimulator {
    /// Builds initial holdings from the NAVs at the start date. Weights are
    /// normalized against whatever sum is supplied. Fails with
    /// `NoInitialNav` when any allocated fund has no resolvable start NAV.
    pub fn new(
        allocations: &[AllocationTarget],
        nav_series: HashMap<String, NavSeries>,
        initial_amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        strategy: RebalanceStrategy,
    ) -> Result<Self> {
        if start_date >= end_date {
            return Err(Error::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        if initial_amount <= Decimal::ZERO {
            return Err(Error::Unexpected(
                "initial amount must be positive".to_string(),
            ));
        }
        let weight_sum: Decimal = allocations.iter().map(|a| a.target_weight).sum();
        if weight_sum <= Decimal::ZERO {
            return Err(Error::Unexpected(
                "portfolio allocations have no positive weight".to_string(),
            ));
        }

        let mut holdings = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let target_weight = allocation.target_weight / weight_sum;
            let nav = nav_series
                .get(&allocation.fund_id)
                .and_then(|s| s.resolve_nav(start_date))
                .ok_or_else(|| Error::NoInitialNav {
                    fund_id: allocation.fund_id.clone(),
                    start_date,
                })?;
            holdings.push(HoldingState {
                fund_id: allocation.fund_id.clone(),
                units: initial_amount * target_weight / nav.nav,
                target_weight,
            });
        }

        Ok(Self {
            holdings,
            nav_series,
            initial_amount,
            start_date,
            end_date,
            strategy,
        })
    }

    /// Portfolio value at a date. Funds without a resolvable NAV that day
    /// are skipped, never zero-filled.
    fn portfolio_value(&self, date: NaiveDate) -> Decimal {
        self.holdings
            .iter()
            .filter_map(|holding| {
                self.nav_series
                    .get(&holding.fund_id)
                    .and_then(|s| s.resolve_nav(date))
                    .map(|point| holding.units * point.nav)
            })
            .sum()
    }

    /// Resets every fund's units to its target share of `total_value` at
    /// that date's NAV. A fund with no resolvable NAV keeps its units for
    /// this rebalance only.
    fn rebalance(&mut self, date: NaiveDate, total_value: Decimal) {
        for holding in &mut self.holdings {
            match self
                .nav_series
                .get(&holding.fund_id)
                .and_then(|s| s.resolve_nav(date))
            {
                Some(point) => {
                    holding.units = total_value * holding.target_weight / point.nav;
                }
                None => {
                    warn!(
                        "No NAV for {} at rebalance on {}; units left unchanged",
                        holding.fund_id, date
                    );
                }
            }
        }
    }

    /// Scheduled rebalance dates: the start date stepped forward by the
    /// calendar period until the end date (exclusive of the start itself).
    fn rebalance_schedule(&self, months: u32) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut current = add_months(self.start_date, months);
        let mut step = months;
        while current <= self.end_date && current > self.start_date {
            dates.push(current);
            step += months;
            current = add_months(self.start_date, step);
        }
        dates
    }

    /// Sparse key dates for calendar-mode evaluation: weekly intervals plus
    /// every rebalance date plus the end date, de-duplicated and sorted.
    fn key_dates(&self, rebalance_dates: &[NaiveDate]) -> Vec<NaiveDate> {
        let mut dates = periodic_dates(self.start_date, self.end_date, KEY_DATE_INTERVAL_DAYS);
        dates.extend_from_slice(rebalance_dates);
        dates.push(self.end_date);
        dates.sort();
        dates.dedup();
        dates
    }

    /// Largest absolute drift from target weight, in percentage points.
    fn max_weight_deviation(&self, date: NaiveDate, total_value: Decimal) -> f64 {
        if total_value <= Decimal::ZERO {
            return 0.0;
        }
        self.holdings
            .iter()
            .filter_map(|holding| {
                let nav = self
                    .nav_series
                    .get(&holding.fund_id)
                    .and_then(|s| s.resolve_nav(date))?;
                let current = holding.units * nav.nav / total_value;
                let drift = (current - holding.target_weight).abs() * Decimal::ONE_HUNDRED;
                drift.to_f64()
            })
            .fold(0.0, f64::max)
    }

    /// Steps through every evaluation date in chronological order and
    /// derives final metrics from the recorded value trajectory.
    pub fn run(mut self) -> Result<SimulationOutcome> {
        let rebalance_dates = match self.strategy {
            RebalanceStrategy::Calendar(frequency) => self.rebalance_schedule(frequency.months()),
            _ => Vec::new(),
        };
        let evaluation_dates = match self.strategy {
            // Threshold triggers can only be detected by checking every day.
            RebalanceStrategy::Threshold { .. } => {
                get_days_between(self.start_date, self.end_date)
            }
            _ => self.key_dates(&rebalance_dates),
        };

        let mut trajectory: Vec<TrajectoryPoint> = Vec::with_capacity(evaluation_dates.len());
        let mut high_water_mark = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;
        let mut next_rebalance = 0usize;
        let mut rebalance_count = 0usize;

        for date in evaluation_dates {
            let value = self.portfolio_value(date);
            if value <= Decimal::ZERO {
                debug!("No fund had a resolvable NAV on {}; date skipped", date);
                continue;
            }
            trajectory.push(TrajectoryPoint { date, value });

            if value > high_water_mark {
                high_water_mark = value;
            }
            if high_water_mark > Decimal::ZERO {
                let drawdown = (high_water_mark - value) / high_water_mark;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }

            match self.strategy {
                RebalanceStrategy::Calendar(_) => {
                    while next_rebalance < rebalance_dates.len()
                        && (date - rebalance_dates[next_rebalance]).num_days()
                            > REBALANCE_DATE_TOLERANCE_DAYS
                    {
                        next_rebalance += 1;
                    }
                    if next_rebalance < rebalance_dates.len()
                        && (date - rebalance_dates[next_rebalance])
                            .num_days()
                            .abs()
                            <= REBALANCE_DATE_TOLERANCE_DAYS
                    {
                        self.rebalance(date, value);
                        rebalance_count += 1;
                        next_rebalance += 1;
                    }
                }
                RebalanceStrategy::Threshold { deviation_percent } => {
                    if self.max_weight_deviation(date, value) > deviation_percent {
                        self.rebalance(date, value);
                        rebalance_count += 1;
                    }
                }
                RebalanceStrategy::BuyAndHold => {}
            }
        }

        let final_value = trajectory
            .last()
            .map(|p| p.value)
            .ok_or_else(|| Error::Unexpected("simulation produced no valuations".to_string()))?;

        let growth = (final_value / self.initial_amount)
            .to_f64()
            .unwrap_or(1.0);
        let total_return = (growth - 1.0) * 100.0;
        let years = years_between(self.start_date, self.end_date);
        let annualized_return = if years > 0.0 && growth > 0.0 {
            (growth.powf(1.0 / years) - 1.0) * 100.0
        } else {
            total_return
        };

        let values: Vec<f64> = trajectory
            .iter()
            .filter_map(|p| p.value.to_f64())
            .collect();
        let sampled_returns = daily_returns_from_values(&values);
        let vol = volatility(&sampled_returns);

        Ok(SimulationOutcome {
            trajectory,
            final_value,
            total_return,
            annualized_return,
            volatility: vol,
            sharpe_ratio: sharpe_ratio(annualized_return, vol, DEFAULT_RISK_FREE_RATE),
            max_drawdown: max_drawdown.to_f64().unwrap_or(0.0),
            rebalance_count,
        })
    }
}
