//! Composite fund scoring against a category peer group.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use log::{debug, error, warn};
use num_traits::ToPrimitive;

use super::percentile_scorer::{score_metric, MetricPolarity};
use super::scoring_constants::{
    category_benchmark, AUM_SIZE_POINTS, BENCHMARK_LOOKBACK_PAD_DAYS,
    CAPTURE_1Y_POINTS, CAPTURE_3Y_POINTS, DEFAULT_SCORE_FRACTION, EXPENSE_RATIO_POINTS,
    FORWARD_OUTLOOK_POINTS, MAX_CONCURRENT_FUND_SCORINGS, MAX_DRAWDOWN_POINTS,
    MIN_NAV_POINTS_FOR_SCORING, ONE_YEAR_DAYS, RETURN_WINDOWS, ReturnWindow,
    SECTOR_SIMILARITY_POINTS, THREE_YEAR_DAYS, VOLATILITY_1Y_POINTS, VOLATILITY_3Y_POINTS,
};

use super::scoring_model::{
    quartile_for_rank, recommendation_for, ComponentScores, ExternalSignals, MetricSet,
    ScoreRecord,
};
use super::scoring_traits::{ScoreSinkTrait, ScoringServiceTrait};
use crate::constants::DEFAULT_RISK_FREE_RATE;
use crate::errors::{Error, Result};
use crate::market_data::{
    BenchmarkProviderTrait, FundCatalogTrait, FundProfile, NavProviderTrait, NavSeries,
};
use crate::stats::{
    aligned_daily_returns, annualized_return, capture_ratio, daily_returns, max_drawdown,
    point_return, sharpe_ratio, sortino_ratio, tracking_error, volatility, CaptureDirection,
};
use crate::utils::CancellationToken;

/// Peer metric values collected for percentile scoring. A peer missing one
/// sub-metric is excluded from that sub-metric's population only.
#[derive(Default)]
struct PeerValues {
    returns: [Vec<f64>; RETURN_WINDOWS.len()],
    volatility_1y: Vec<f64>,
    volatility_3y: Vec<f64>,
    up_capture_1y: Vec<f64>,
    up_capture_3y: Vec<f64>,
    max_drawdown: Vec<f64>,
    aum: Vec<f64>,
    expense_ratio: Vec<f64>,
    sector_similarity: Vec<f64>,
    forward_outlook: Vec<f64>,
}

/// Scores funds against their category peers and assigns quartiles and
/// recommendations. All data access goes through the injected provider
/// traits; the service holds no storage of its own beyond the per-run
/// ranking registry.
pub struct ScoringService {
    nav_provider: Arc<dyn NavProviderTrait>,
    fund_catalog: Arc<dyn FundCatalogTrait>,
    benchmark_provider: Arc<dyn BenchmarkProviderTrait>,
    score_sink: Option<Arc<dyn ScoreSinkTrait>>,
    /// Current total scores per (category, score date). Writes replace per
    /// fund id, so re-scoring never leaves a duplicate behind.
    category_totals: DashMap<(String, NaiveDate), BTreeMap<String, f64>>,
}

impl ScoringService {
    pub fn new(
        nav_provider: Arc<dyn NavProviderTrait>,
        fund_catalog: Arc<dyn FundCatalogTrait>,
        benchmark_provider: Arc<dyn BenchmarkProviderTrait>,
        score_sink: Option<Arc<dyn ScoreSinkTrait>>,
    ) -> Self {
        Self {
            nav_provider,
            fund_catalog,
            benchmark_provider,
            score_sink,
            category_totals: DashMap::new(),
        }
    }

    /// Whether the series reaches back at least `days` before `as_of`.
    fn covers(series: &NavSeries, days: i64, as_of: NaiveDate) -> bool {
        series
            .first()
            .is_some_and(|p| p.date <= as_of - Duration::days(days))
    }

    /// Trailing return for one scoring window, annualized when the window
    /// calls for it.
    fn window_return(series: &NavSeries, window: &ReturnWindow, as_of: NaiveDate) -> Option<f64> {
        if window.annualized {
            annualized_return(series, window.days, as_of)
        } else {
            point_return(series, window.days, as_of)
        }
    }

    /// Derives the full metric set for one fund series. `benchmark` is the
    /// category index series; when absent, benchmark-relative metrics stay
    /// `None`.
    fn compute_metric_set(
        series: &NavSeries,
        benchmark: Option<&NavSeries>,
        as_of: NaiveDate,
    ) -> MetricSet {
        let mut metrics = MetricSet {
            return_3m: Self::window_return(series, &RETURN_WINDOWS[0], as_of),
            return_6m: Self::window_return(series, &RETURN_WINDOWS[1], as_of),
            return_1y: Self::window_return(series, &RETURN_WINDOWS[2], as_of),
            return_3y: Self::window_return(series, &RETURN_WINDOWS[3], as_of),
            return_5y: Self::window_return(series, &RETURN_WINDOWS[4], as_of),
            max_drawdown: max_drawdown(series),
            ..MetricSet::default()
        };

        if Self::covers(series, ONE_YEAR_DAYS, as_of) {
            let window = series.window(as_of - Duration::days(ONE_YEAR_DAYS), as_of);
            let returns = daily_returns(&window);
            let vol = volatility(&returns);
            metrics.volatility_1y = Some(vol);
            metrics.sortino_1y = Some(sortino_ratio(&returns, DEFAULT_RISK_FREE_RATE));
            metrics.sharpe_1y = annualized_return(series, ONE_YEAR_DAYS, as_of)
                .map(|annual| sharpe_ratio(annual, vol, DEFAULT_RISK_FREE_RATE));
        }
        if Self::covers(series, THREE_YEAR_DAYS, as_of) {
            let window = series.window(as_of - Duration::days(THREE_YEAR_DAYS), as_of);
            let returns = daily_returns(&window);
            let vol = volatility(&returns);
            metrics.volatility_3y = Some(vol);
            metrics.sortino_3y = Some(sortino_ratio(&returns, DEFAULT_RISK_FREE_RATE));
            metrics.sharpe_3y = annualized_return(series, THREE_YEAR_DAYS, as_of)
                .map(|annual| sharpe_ratio(annual, vol, DEFAULT_RISK_FREE_RATE));
        }

        if let Some(bench) = benchmark {
            if Self::covers(series, ONE_YEAR_DAYS, as_of) {
                let start = as_of - Duration::days(ONE_YEAR_DAYS);
                let (fund_rets, bench_rets) =
                    aligned_daily_returns(&series.window(start, as_of), &bench.window(start, as_of));
                if !fund_rets.is_empty() {
                    metrics.up_capture_1y =
                        Some(capture_ratio(&fund_rets, &bench_rets, CaptureDirection::Up));
                    metrics.down_capture_1y =
                        Some(capture_ratio(&fund_rets, &bench_rets, CaptureDirection::Down));
                    metrics.tracking_error_1y = Some(tracking_error(&fund_rets, &bench_rets));
                }
            }
            if Self::covers(series, THREE_YEAR_DAYS, as_of) {
                let start = as_of - Duration::days(THREE_YEAR_DAYS);
                let (fund_rets, bench_rets) =
                    aligned_daily_returns(&series.window(start, as_of), &bench.window(start, as_of));
                if !fund_rets.is_empty() {
                    metrics.up_capture_3y =
                        Some(capture_ratio(&fund_rets, &bench_rets, CaptureDirection::Up));
                    metrics.down_capture_3y =
                        Some(capture_ratio(&fund_rets, &bench_rets, CaptureDirection::Down));
                }
            }
        }
        metrics
    }

    async fn fetch_benchmark(&self, category: &str, score_date: NaiveDate) -> Option<NavSeries> {
        let index = category_benchmark(category);
        let start = score_date - Duration::days(THREE_YEAR_DAYS + BENCHMARK_LOOKBACK_PAD_DAYS);
        match self
            .benchmark_provider
            .get_index_series(index, start, score_date)
            .await
        {
            Ok(series) if !series.is_empty() => Some(series),
            Ok(_) => {
                warn!(
                    "No benchmark data for '{}' up to {}; capture sub-scores fall back to the default band",
                    index, score_date
                );
                None
            }
            Err(e) => {
                warn!(
                    "Benchmark fetch failed for '{}': {}; capture sub-scores fall back to the default band",
                    index, e
                );
                None
            }
        }
    }

    /// Collects peer metric values for every percentile population. Peers
    /// that cannot supply a value for one sub-metric are excluded from that
    /// population only; a peer whose NAV fetch fails contributes reference
    /// data (AUM, expense) but no series-derived values.
    async fn collect_peer_values(
        &self,
        subject: &FundProfile,
        peers: &[FundProfile],
        benchmark: Option<&NavSeries>,
        score_date: NaiveDate,
        signals: &ExternalSignals,
    ) -> PeerValues {
        let mut values = PeerValues::default();
        for peer in peers {
            if peer.id == subject.id {
                continue;
            }
            if let Some(aum) = peer.aum.and_then(|v| v.to_f64()) {
                values.aum.push(aum);
            }
            if let Some(expense) = peer.expense_ratio.and_then(|v| v.to_f64()) {
                values.expense_ratio.push(expense);
            }
            if let Some(&similarity) = signals.sector_similarity.get(&peer.id) {
                values.sector_similarity.push(similarity);
            }
            if let Some(&outlook) = signals.forward_outlook.get(&peer.id) {
                values.forward_outlook.push(outlook);
            }

            let series = match self
                .nav_provider
                .get_nav_series(&peer.id, None, Some(score_date))
                .await
            {
                Ok(series) if !series.is_empty() => series,
                Ok(_) => {
                    debug!("Peer {} has no NAV history; excluded", peer.id);
                    continue;
                }
                Err(e) => {
                    debug!("Peer {} NAV fetch failed: {}; excluded", peer.id, e);
                    continue;
                }
            };
            let metrics = Self::compute_metric_set(&series, benchmark, score_date);
            let window_values = [
                metrics.return_3m,
                metrics.return_6m,
                metrics.return_1y,
                metrics.return_3y,
                metrics.return_5y,
            ];
            for (slot, value) in values.returns.iter_mut().zip(window_values) {
                if let Some(v) = value {
                    slot.push(v);
                }
            }
            if let Some(v) = metrics.volatility_1y {
                values.volatility_1y.push(v);
            }
            if let Some(v) = metrics.volatility_3y {
                values.volatility_3y.push(v);
            }
            if let Some(v) = metrics.up_capture_1y {
                values.up_capture_1y.push(v);
            }
            if let Some(v) = metrics.up_capture_3y {
                values.up_capture_3y.push(v);
            }
            if series.len() >= 2 {
                values.max_drawdown.push(metrics.max_drawdown);
            }
        }
        values
    }

    /// Scores a sub-metric, falling back to the neutral default band when
    /// the fund's own value is unavailable.
    fn points_for(
        value: Option<f64>,
        peer_values: &[f64],
        polarity: MetricPolarity,
        max_points: f64,
    ) -> f64 {
        match value {
            Some(v) => score_metric(v, peer_values, polarity, max_points),
            None => DEFAULT_SCORE_FRACTION * max_points,
        }
    }

    /// Records the fund's total in the ranking registry and returns its
    /// 1-based rank and the population size. Ordering is total descending
    /// with ties broken by fund id ascending, so ranking is deterministic.
    fn rank_in_category(
        &self,
        category: &str,
        score_date: NaiveDate,
        fund_id: &str,
        total_score: f64,
    ) -> (usize, usize) {
        let key = (category.to_string(), score_date);
        let mut entry = self.category_totals.entry(key).or_default();
        entry.insert(fund_id.to_string(), total_score);
        let ranked = Self::sorted_totals(&entry);
        let rank = ranked
            .iter()
            .position(|(id, _)| id == fund_id)
            .map(|p| p + 1)
            .unwrap_or(1);
        (rank, ranked.len())
    }

    fn sorted_totals(totals: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> =
            totals.iter().map(|(id, &t)| (id.clone(), t)).collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }

    fn ranked_totals(&self, category: &str, score_date: NaiveDate) -> Vec<(String, f64)> {
        self.category_totals
            .get(&(category.to_string(), score_date))
            .map(|entry| Self::sorted_totals(&entry))
            .unwrap_or_default()
    }

    /// Computes a fund's score without emitting it to the sink.
    async fn compute_score(
        &self,
        profile: &FundProfile,
        score_date: NaiveDate,
        signals: &ExternalSignals,
    ) -> Result<ScoreRecord> {
        let series = self
            .nav_provider
            .get_nav_series(&profile.id, None, Some(score_date))
            .await?;
        if series.len() < MIN_NAV_POINTS_FOR_SCORING {
            return Err(Error::InsufficientData {
                fund_id: profile.id.clone(),
                available: series.len(),
                required: MIN_NAV_POINTS_FOR_SCORING,
            });
        }

        let benchmark = self.fetch_benchmark(&profile.category, score_date).await;
        let metrics = Self::compute_metric_set(&series, benchmark.as_ref(), score_date);

        let peers = self
            .fund_catalog
            .get_funds_by_category(&profile.category)
            .await?;
        let peer_values = self
            .collect_peer_values(profile, &peers, benchmark.as_ref(), score_date, signals)
            .await;

        let fund_windows = [
            metrics.return_3m,
            metrics.return_6m,
            metrics.return_1y,
            metrics.return_3y,
            metrics.return_5y,
        ];
        let historical_returns: f64 = RETURN_WINDOWS
            .iter()
            .zip(fund_windows)
            .zip(&peer_values.returns)
            .map(|((window, value), peers)| {
                if value.is_none() {
                    debug!(
                        "{}: {} return unavailable; scored at the default band",
                        profile.id, window.label
                    );
                }
                Self::points_for(value, peers, MetricPolarity::HigherIsBetter, window.max_points)
            })
            .sum();

        let risk_grade = Self::points_for(
            metrics.volatility_1y,
            &peer_values.volatility_1y,
            MetricPolarity::LowerIsBetter,
            VOLATILITY_1Y_POINTS,
        ) + Self::points_for(
            metrics.volatility_3y,
            &peer_values.volatility_3y,
            MetricPolarity::LowerIsBetter,
            VOLATILITY_3Y_POINTS,
        ) + Self::points_for(
            metrics.up_capture_1y,
            &peer_values.up_capture_1y,
            MetricPolarity::HigherIsBetter,
            CAPTURE_1Y_POINTS,
        ) + Self::points_for(
            metrics.up_capture_3y,
            &peer_values.up_capture_3y,
            MetricPolarity::HigherIsBetter,
            CAPTURE_3Y_POINTS,
        ) + Self::points_for(
            Some(metrics.max_drawdown),
            &peer_values.max_drawdown,
            MetricPolarity::LowerIsBetter,
            MAX_DRAWDOWN_POINTS,
        );

        let other_metrics = Self::points_for(
            signals.sector_similarity.get(&profile.id).copied(),
            &peer_values.sector_similarity,
            MetricPolarity::HigherIsBetter,
            SECTOR_SIMILARITY_POINTS,
        ) + Self::points_for(
            signals.forward_outlook.get(&profile.id).copied(),
            &peer_values.forward_outlook,
            MetricPolarity::HigherIsBetter,
            FORWARD_OUTLOOK_POINTS,
        ) + Self::points_for(
            profile.aum.and_then(|v| v.to_f64()),
            &peer_values.aum,
            MetricPolarity::HigherIsBetter,
            AUM_SIZE_POINTS,
        ) + Self::points_for(
            profile.expense_ratio.and_then(|v| v.to_f64()),
            &peer_values.expense_ratio,
            MetricPolarity::LowerIsBetter,
            EXPENSE_RATIO_POINTS,
        );

        let component_scores = ComponentScores {
            historical_returns,
            risk_grade,
            other_metrics,
        };
        let total_score = historical_returns + risk_grade + other_metrics;

        let (category_rank, category_total) =
            self.rank_in_category(&profile.category, score_date, &profile.id, total_score);
        let quartile = quartile_for_rank(category_rank, category_total);

        Ok(ScoreRecord {
            id: ScoreRecord::record_id(&profile.id, score_date),
            fund_id: profile.id.clone(),
            category: profile.category.clone(),
            score_date,
            metrics,
            component_scores,
            total_score,
            quartile,
            category_rank,
            category_total,
            recommendation: recommendation_for(quartile, total_score),
            calculated_at: Utc::now(),
        })
    }

    /// Delivers a record to the sink. The computed record is returned to
    /// the caller regardless; a sink failure is surfaced in the log, never
    /// allowed to void the result.
    async fn emit(&self, record: &ScoreRecord) {
        if let Some(sink) = &self.score_sink {
            if let Err(e) = sink.save_score(record).await {
                error!("Failed to persist score {}: {}", record.id, e);
            }
        }
    }
}

#[async_trait]
impl ScoringServiceTrait for ScoringService {
    async fn score_fund(
        &self,
        fund_id: &str,
        score_date: NaiveDate,
        signals: &ExternalSignals,
    ) -> Result<ScoreRecord> {
        let profile = self
            .fund_catalog
            .get_fund_profile(fund_id)
            .await?
            .ok_or_else(|| Error::FundNotFound(fund_id.to_string()))?;
        let record = self.compute_score(&profile, score_date, signals).await?;
        self.emit(&record).await;
        Ok(record)
    }

    async fn score_category(
        &self,
        category: &str,
        score_date: NaiveDate,
        signals: &ExternalSignals,
        cancel: &CancellationToken,
    ) -> Result<Vec<ScoreRecord>> {
        let profiles = self.fund_catalog.get_funds_by_category(category).await?;
        debug!(
            "Scoring {} funds in category '{}' for {}",
            profiles.len(),
            category,
            score_date
        );

        let results: Vec<Option<ScoreRecord>> = stream::iter(profiles)
            .map(|profile| async move {
                if cancel.is_cancelled() {
                    return None;
                }
                match self.compute_score(&profile, score_date, signals).await {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping {} for {}: {}", profile.id, score_date, e);
                        None
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FUND_SCORINGS)
            .collect()
            .await;
        let mut records: Vec<ScoreRecord> = results.into_iter().flatten().collect();

        // Quartiles assigned while the batch was in flight reflect partial
        // populations; re-rank the whole batch so emitted records agree.
        let ranked = self.ranked_totals(category, score_date);
        for record in &mut records {
            if let Some(position) = ranked.iter().position(|(id, _)| id == &record.fund_id) {
                record.category_rank = position + 1;
                record.category_total = ranked.len();
                record.quartile = quartile_for_rank(record.category_rank, record.category_total);
                record.recommendation = recommendation_for(record.quartile, record.total_score);
            }
        }
        records.sort_by_key(|r| r.category_rank);

        for record in &records {
            self.emit(record).await;
        }
        Ok(records)
    }
}
