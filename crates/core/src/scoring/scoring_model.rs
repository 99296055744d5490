//! Score-record domain models and ranking helpers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::scoring_constants::{HOLD_MIN_SCORE, REVIEW_MIN_SCORE};

/// Action suggested for a fund given its quartile and total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Review,
    Sell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Review => "REVIEW",
            Recommendation::Sell => "SELL",
        }
    }
}

/// Derived per-fund statistics for one evaluation date. Recomputed on
/// demand; `None` means the series does not cover that metric's window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    pub return_3m: Option<f64>,
    pub return_6m: Option<f64>,
    pub return_1y: Option<f64>,
    pub return_3y: Option<f64>,
    pub return_5y: Option<f64>,
    pub volatility_1y: Option<f64>,
    pub volatility_3y: Option<f64>,
    pub sharpe_1y: Option<f64>,
    pub sharpe_3y: Option<f64>,
    pub sortino_1y: Option<f64>,
    pub sortino_3y: Option<f64>,
    pub max_drawdown: f64,
    pub up_capture_1y: Option<f64>,
    pub up_capture_3y: Option<f64>,
    pub down_capture_1y: Option<f64>,
    pub down_capture_3y: Option<f64>,
    pub tracking_error_1y: Option<f64>,
}

/// Points earned per scoring component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    pub historical_returns: f64,
    pub risk_grade: f64,
    pub other_metrics: f64,
}

/// Externally-computed signals fed into the other-metrics component, keyed
/// by fund id. Sector similarity and forward outlook come from the macro /
/// sentiment layer outside this core; funds without an entry score at the
/// neutral default band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalSignals {
    pub sector_similarity: HashMap<String, f64>,
    pub forward_outlook: HashMap<String, f64>,
}

/// Immutable scoring snapshot for one fund on one date. Re-scoring the same
/// `(fund_id, score_date)` replaces the previous record rather than
/// mutating it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: String,
    pub fund_id: String,
    pub category: String,
    pub score_date: NaiveDate,
    pub metrics: MetricSet,
    pub component_scores: ComponentScores,
    pub total_score: f64,
    /// 1 = best quartile within the category for this score date.
    pub quartile: u8,
    pub category_rank: usize,
    pub category_total: usize,
    pub recommendation: Recommendation,
    pub calculated_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn record_id(fund_id: &str, score_date: NaiveDate) -> String {
        format!("{}_{}", fund_id, score_date)
    }
}

/// Maps a 1-based rank to a quartile. The first three quartiles each take
/// `ceil(n / 4)` ranks and the fourth absorbs the remainder.
pub fn quartile_for_rank(rank: usize, total: usize) -> u8 {
    debug_assert!(rank >= 1 && rank <= total);
    let bucket = total.div_ceil(4).max(1);
    match (rank - 1) / bucket {
        0 => 1,
        1 => 2,
        2 => 3,
        _ => 4,
    }
}

/// Maps quartile and total score to a recommendation.
pub fn recommendation_for(quartile: u8, total_score: f64) -> Recommendation {
    match quartile {
        1 => Recommendation::Buy,
        2 => {
            if total_score >= HOLD_MIN_SCORE {
                Recommendation::Hold
            } else {
                Recommendation::Review
            }
        }
        3 => {
            if total_score >= REVIEW_MIN_SCORE {
                Recommendation::Review
            } else {
                Recommendation::Sell
            }
        }
        _ => Recommendation::Sell,
    }
}
