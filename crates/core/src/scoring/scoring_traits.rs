use async_trait::async_trait;
use chrono::NaiveDate;

use super::scoring_model::{ExternalSignals, ScoreRecord};
use crate::errors::Result;
use crate::utils::CancellationToken;

#[async_trait]
pub trait ScoringServiceTrait: Send + Sync {
    /// Scores one fund against its category peers for a date. Fails with
    /// `InsufficientData` when the fund's own history is too short; peer
    /// and benchmark gaps degrade individual sub-scores instead.
    async fn score_fund(
        &self,
        fund_id: &str,
        score_date: NaiveDate,
        signals: &ExternalSignals,
    ) -> Result<ScoreRecord>;

    /// Scores every fund in a category with bounded concurrency. Funds that
    /// cannot be scored are skipped; records already computed when
    /// cancellation is observed are still returned, re-ranked consistently.
    async fn score_category(
        &self,
        category: &str,
        score_date: NaiveDate,
        signals: &ExternalSignals,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScoreRecord>>;
}

/// Persistence boundary for score records. Emission is replace-on-conflict
/// for the `(fund_id, score_date)` key.
#[async_trait]
pub trait ScoreSinkTrait: Send + Sync {
    async fn save_score(&self, record: &ScoreRecord) -> Result<()>;
}
