use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_model::{FundProfile, NavPoint, NavSeries};
use crate::errors::Result;

/// Read-only access to fund NAV histories. Owned by the external data
/// layer; the core only reads snapshots and windows of it.
#[async_trait]
pub trait NavProviderTrait: Send + Sync {
    /// Ordered NAV history for a fund, optionally clipped to a date range.
    async fn get_nav_series(
        &self,
        fund_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<NavSeries>;

    /// The most recent published NAV, if any.
    async fn get_latest_nav(&self, fund_id: &str) -> Result<Option<NavPoint>>;
}

/// Read-only fund reference data and peer-group resolution.
#[async_trait]
pub trait FundCatalogTrait: Send + Sync {
    async fn get_fund_profile(&self, fund_id: &str) -> Result<Option<FundProfile>>;

    /// All funds sharing a category; the comparison population for
    /// percentile scoring.
    async fn get_funds_by_category(&self, category: &str) -> Result<Vec<FundProfile>>;
}

/// Read-only access to market index histories.
#[async_trait]
pub trait BenchmarkProviderTrait: Send + Sync {
    /// Index levels over a window. An empty series means "no data" and must
    /// never be treated as zero-valued data.
    async fn get_index_series(
        &self,
        index_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<NavSeries>;
}
