//! Backtest orchestration: request resolution, NAV prefetching, simulation,
//! and benchmark comparison.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use log::{debug, error, warn};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::backtest_constants::{
    default_risk_profile_allocations, MAX_CONCURRENT_BACKTESTS, NAV_LOOKBACK_PAD_DAYS,
    STRESS_TEST_HORIZON_DAYS,
};
use super::backtest_model::{
    BacktestRequest, BacktestResult, RebalanceStrategy, SimulationOutcome, StressTestRequest,
    TrajectoryPoint,
};
use super::backtest_traits::{BacktestServiceTrait, BacktestSinkTrait, PortfolioSourceTrait};
use super::portfolio_simulator::PortfolioSimulator;
use crate::errors::{Error, Result};
use crate::market_data::{
    AllocationTarget, BenchmarkProviderTrait, NavPoint, NavProviderTrait, NavSeries,
};
use crate::stats::point_return;
use crate::utils::CancellationToken;

/// Runs portfolio simulations against historical or synthetic NAV paths.
/// Providers and the portfolio source are injected; the service keeps no
/// state between runs, so independent runs may execute concurrently.
pub struct BacktestService {
    nav_provider: Arc<dyn NavProviderTrait>,
    benchmark_provider: Arc<dyn BenchmarkProviderTrait>,
    portfolio_source: Arc<dyn PortfolioSourceTrait>,
    result_sink: Option<Arc<dyn BacktestSinkTrait>>,
}

impl BacktestService {
    pub fn new(
        nav_provider: Arc<dyn NavProviderTrait>,
        benchmark_provider: Arc<dyn BenchmarkProviderTrait>,
        portfolio_source: Arc<dyn PortfolioSourceTrait>,
        result_sink: Option<Arc<dyn BacktestSinkTrait>>,
    ) -> Self {
        Self {
            nav_provider,
            benchmark_provider,
            portfolio_source,
            result_sink,
        }
    }

    /// Resolves the request to concrete allocation targets: explicit
    /// allocations first, then the named portfolio, then the risk profile
    /// with the built-in default table as a last resort.
    async fn resolve_allocations(
        &self,
        allocations: &Option<Vec<AllocationTarget>>,
        portfolio_id: &Option<String>,
        risk_profile: &Option<String>,
    ) -> Result<Vec<AllocationTarget>> {
        if let Some(explicit) = allocations {
            if !explicit.is_empty() {
                return Ok(explicit.clone());
            }
        }
        if let Some(portfolio_id) = portfolio_id {
            if let Some(resolved) = self
                .portfolio_source
                .get_portfolio_allocations(portfolio_id)
                .await?
            {
                return Ok(resolved);
            }
        }
        if let Some(profile) = risk_profile {
            if let Some(resolved) = self
                .portfolio_source
                .get_risk_profile_allocations(profile)
                .await?
            {
                return Ok(resolved);
            }
            if let Some(fallback) = default_risk_profile_allocations(profile) {
                debug!("Using built-in default allocations for risk profile '{profile}'");
                return Ok(fallback);
            }
        }
        let requested = portfolio_id
            .clone()
            .or_else(|| risk_profile.clone())
            .unwrap_or_else(|| "<unspecified>".to_string());
        Err(Error::PortfolioNotFound(requested))
    }

    /// Prefetches the NAV history for every allocated fund, padded before
    /// the start date so the first valuation resolves over non-trading days.
    async fn fetch_nav_series(
        &self,
        allocations: &[AllocationTarget],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<HashMap<String, NavSeries>> {
        let fetch_start = start_date - Duration::days(NAV_LOOKBACK_PAD_DAYS);
        let mut series = HashMap::with_capacity(allocations.len());
        for allocation in allocations {
            let history = self
                .nav_provider
                .get_nav_series(&allocation.fund_id, Some(fetch_start), Some(end_date))
                .await?;
            series.insert(allocation.fund_id.clone(), history);
        }
        Ok(series)
    }

    /// Benchmark trajectory and window return, sampled at the same dates as
    /// the portfolio trajectory. `None` when the index has no data over the
    /// window; comparison is omitted, never synthesized.
    async fn benchmark_comparison(
        &self,
        index_name: &str,
        initial_amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sample_dates: &[NaiveDate],
    ) -> Option<(Vec<TrajectoryPoint>, f64)> {
        let series = match self
            .benchmark_provider
            .get_index_series(index_name, start_date - Duration::days(NAV_LOOKBACK_PAD_DAYS), end_date)
            .await
        {
            Ok(series) if !series.is_empty() => series,
            Ok(_) => {
                warn!("No benchmark data for '{index_name}' in window; comparison omitted");
                return None;
            }
            Err(e) => {
                warn!("Benchmark fetch failed for '{index_name}': {e}; comparison omitted");
                return None;
            }
        };
        let base = series.resolve_nav(start_date)?.nav;
        let trajectory: Vec<TrajectoryPoint> = sample_dates
            .iter()
            .filter_map(|&date| {
                series.resolve_nav(date).map(|point| TrajectoryPoint {
                    date,
                    value: initial_amount * point.nav / base,
                })
            })
            .collect();
        let window_days = (end_date - start_date).num_days();
        let benchmark_return = point_return(&series, window_days, end_date)?;
        Some((trajectory, benchmark_return))
    }

    fn build_result(
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_amount: Decimal,
        outcome: SimulationOutcome,
        benchmark_index: Option<String>,
        benchmark: Option<(Vec<TrajectoryPoint>, f64)>,
    ) -> BacktestResult {
        let (benchmark_trajectory, benchmark_return) = match benchmark {
            Some((trajectory, window_return)) => (Some(trajectory), Some(window_return)),
            None => (None, None),
        };
        BacktestResult {
            start_date,
            end_date,
            initial_amount,
            final_amount: outcome.final_value,
            total_return: outcome.total_return,
            annualized_return: outcome.annualized_return,
            max_drawdown: outcome.max_drawdown,
            volatility: outcome.volatility,
            sharpe_ratio: outcome.sharpe_ratio,
            benchmark_index,
            benchmark_return,
            value_trajectory: outcome.trajectory,
            benchmark_trajectory,
            calculated_at: Utc::now(),
        }
    }

    /// Delivers a result to the sink. The result is returned to the caller
    /// regardless; sink failures are surfaced in the log.
    async fn emit(&self, result: &BacktestResult) {
        if let Some(sink) = &self.result_sink {
            if let Err(e) = sink.save_result(result).await {
                error!("Failed to persist backtest result: {e}");
            }
        }
    }

    async fn execute(
        &self,
        allocations: &[AllocationTarget],
        initial_amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
        strategy: RebalanceStrategy,
        benchmark_index: Option<&str>,
    ) -> Result<BacktestResult> {
        if start_date >= end_date {
            return Err(Error::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        let nav_series = self
            .fetch_nav_series(allocations, start_date, end_date)
            .await?;
        let simulator = PortfolioSimulator::new(
            allocations,
            nav_series,
            initial_amount,
            start_date,
            end_date,
            strategy,
        )?;
        let outcome = simulator.run()?;

        let benchmark = match benchmark_index {
            Some(index) => {
                let sample_dates: Vec<NaiveDate> =
                    outcome.trajectory.iter().map(|p| p.date).collect();
                self.benchmark_comparison(
                    index,
                    initial_amount,
                    start_date,
                    end_date,
                    &sample_dates,
                )
                .await
            }
            None => None,
        };

        let result = Self::build_result(
            start_date,
            end_date,
            initial_amount,
            outcome,
            benchmark_index.map(str::to_string),
            benchmark,
        );
        self.emit(&result).await;
        Ok(result)
    }

    /// Builds the synthetic shock-and-recovery NAV path for one fund:
    /// linear decline to the shock floor, then linear recovery to the
    /// pre-shock level, flat afterwards.
    fn shock_series(
        latest: &NavPoint,
        shock_percent: f64,
        shock_duration_days: i64,
        recovery_days: i64,
    ) -> NavSeries {
        let shock_duration = shock_duration_days.max(1);
        let recovery = recovery_days.max(1);
        let floor_fraction = shock_percent / 100.0;
        (0..=STRESS_TEST_HORIZON_DAYS)
            .filter_map(|day| {
                let multiplier = if day <= shock_duration {
                    1.0 - floor_fraction * day as f64 / shock_duration as f64
                } else if day <= shock_duration + recovery {
                    let recovered = (day - shock_duration) as f64 / recovery as f64;
                    1.0 - floor_fraction * (1.0 - recovered)
                } else {
                    1.0
                };
                Decimal::from_f64(multiplier).map(|m| NavPoint {
                    date: latest.date + Duration::days(day),
                    nav: (latest.nav * m).round_dp(6),
                })
            })
            .collect()
    }
}

#[async_trait]
impl BacktestServiceTrait for BacktestService {
    async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult> {
        if request.start_date >= request.end_date {
            return Err(Error::InvalidDateRange {
                start: request.start_date,
                end: request.end_date,
            });
        }
        let allocations = self
            .resolve_allocations(
                &request.allocations,
                &request.portfolio_id,
                &request.risk_profile,
            )
            .await?;
        self.execute(
            &allocations,
            request.initial_amount,
            request.start_date,
            request.end_date,
            request.strategy,
            request.benchmark_index.as_deref(),
        )
        .await
    }

    async fn run_stress_test(&self, request: &StressTestRequest) -> Result<BacktestResult> {
        let allocations = self
            .resolve_allocations(&request.allocations, &None, &request.risk_profile)
            .await?;

        // Anchor the scenario at the most recently published NAV across the
        // allocated funds; every synthetic path starts there.
        let mut latest_points: HashMap<String, NavPoint> = HashMap::new();
        for allocation in &allocations {
            match self.nav_provider.get_latest_nav(&allocation.fund_id).await? {
                Some(latest) => {
                    latest_points.insert(allocation.fund_id.clone(), latest);
                }
                None => {
                    return Err(Error::FundNotFound(allocation.fund_id.clone()));
                }
            }
        }
        let anchor = latest_points
            .values()
            .map(|p| p.date)
            .max()
            .ok_or_else(|| Error::Unexpected("stress test has no allocations".to_string()))?;

        let nav_series: HashMap<String, NavSeries> = latest_points
            .iter()
            .map(|(fund_id, latest)| {
                let anchored = NavPoint {
                    date: anchor,
                    nav: latest.nav,
                };
                (
                    fund_id.clone(),
                    Self::shock_series(
                        &anchored,
                        request.shock_percent,
                        request.shock_duration_days,
                        request.recovery_days,
                    ),
                )
            })
            .collect();

        let end_date = anchor + Duration::days(STRESS_TEST_HORIZON_DAYS);
        let simulator = PortfolioSimulator::new(
            &allocations,
            nav_series,
            request.initial_amount,
            anchor,
            end_date,
            RebalanceStrategy::BuyAndHold,
        )?;
        let outcome = simulator.run()?;

        // A synthetic path has no meaningful market benchmark.
        let result = Self::build_result(
            anchor,
            end_date,
            request.initial_amount,
            outcome,
            None,
            None,
        );
        self.emit(&result).await;
        Ok(result)
    }

    async fn run_threshold_sweep(
        &self,
        request: &BacktestRequest,
        thresholds: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Vec<BacktestResult>> {
        if request.start_date >= request.end_date {
            return Err(Error::InvalidDateRange {
                start: request.start_date,
                end: request.end_date,
            });
        }
        let allocations = self
            .resolve_allocations(
                &request.allocations,
                &request.portfolio_id,
                &request.risk_profile,
            )
            .await?;

        let results: Vec<Option<BacktestResult>> = stream::iter(thresholds.iter().copied())
            .map(|deviation_percent| {
                let allocations = &allocations;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    match self
                        .execute(
                            allocations,
                            request.initial_amount,
                            request.start_date,
                            request.end_date,
                            RebalanceStrategy::Threshold { deviation_percent },
                            request.benchmark_index.as_deref(),
                        )
                        .await
                    {
                        Ok(result) => Some(result),
                        Err(e) => {
                            warn!("Threshold run at {deviation_percent}% failed: {e}");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_BACKTESTS)
            .collect()
            .await;
        Ok(results.into_iter().flatten().collect())
    }
}
