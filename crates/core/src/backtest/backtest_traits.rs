use async_trait::async_trait;

use super::backtest_model::{BacktestRequest, BacktestResult, StressTestRequest};
use crate::errors::Result;
use crate::market_data::AllocationTarget;
use crate::utils::CancellationToken;

/// Resolves portfolio definitions supplied from outside the core.
#[async_trait]
pub trait PortfolioSourceTrait: Send + Sync {
    /// Concrete allocations for a named portfolio, if one exists.
    async fn get_portfolio_allocations(
        &self,
        portfolio_id: &str,
    ) -> Result<Option<Vec<AllocationTarget>>>;

    /// Concrete allocations defined for a risk profile, if any. When absent
    /// the engine falls back to its built-in default table.
    async fn get_risk_profile_allocations(
        &self,
        risk_profile: &str,
    ) -> Result<Option<Vec<AllocationTarget>>>;
}

#[async_trait]
pub trait BacktestServiceTrait: Send + Sync {
    /// Simulates a portfolio over a historical window and compares it
    /// against a benchmark index where index data exists.
    async fn run_backtest(&self, request: &BacktestRequest) -> Result<BacktestResult>;

    /// Simulates a synthetic shock-and-recovery path over a fixed horizon.
    async fn run_stress_test(&self, request: &StressTestRequest) -> Result<BacktestResult>;

    /// Runs the same request under several deviation thresholds
    /// concurrently. Runs completed before cancellation are returned.
    async fn run_threshold_sweep(
        &self,
        request: &BacktestRequest,
        thresholds: &[f64],
        cancel: &CancellationToken,
    ) -> Result<Vec<BacktestResult>>;
}

/// Persistence boundary for backtest results.
#[async_trait]
pub trait BacktestSinkTrait: Send + Sync {
    async fn save_result(&self, result: &BacktestResult) -> Result<()>;
}
