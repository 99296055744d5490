//! NAV and fund reference-data models.
//!
//! These are read-only snapshots supplied by external providers. The core
//! never mutates a series once fetched for a computation.

use chrono::NaiveDate;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single published net-asset-value observation for one fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
}

/// An ordered NAV history for one fund.
///
/// Invariant: dates strictly increasing, `nav > 0`. The constructor sorts
/// and de-duplicates (last value wins for a repeated date) so that series
/// assembled from provider rows always satisfy the invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    pub fn new(mut points: Vec<NavPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        points.dedup_by(|b, a| {
            if a.date == b.date {
                a.nav = b.nav;
                true
            } else {
                false
            }
        });
        points.retain(|p| p.nav > Decimal::ZERO);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<&NavPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NavPoint> {
        self.points.iter()
    }

    /// The latest point at or before `date`.
    pub fn nav_at_or_before(&self, date: NaiveDate) -> Option<&NavPoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            None
        } else {
            self.points.get(idx - 1)
        }
    }

    /// The earliest point strictly after `date`.
    pub fn nav_after(&self, date: NaiveDate) -> Option<&NavPoint> {
        let idx = self.points.partition_point(|p| p.date <= date);
        self.points.get(idx)
    }

    /// NAV lookup policy used throughout the core: prefer an exact match,
    /// else the latest point strictly before `date`, else the earliest
    /// point strictly after it. `None` only when the series is empty.
    pub fn resolve_nav(&self, date: NaiveDate) -> Option<&NavPoint> {
        self.nav_at_or_before(date).or_else(|| self.nav_after(date))
    }

    /// The sub-series with dates in `[start, end]`, inclusive.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> NavSeries {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        NavSeries {
            points: self.points[lo..hi].to_vec(),
        }
    }

    /// NAV values as `f64`, in chronological order, for float statistics.
    pub fn values_f64(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.nav.to_f64())
            .collect()
    }
}

impl FromIterator<NavPoint> for NavSeries {
    fn from_iter<I: IntoIterator<Item = NavPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read-only reference data for one fund, supplied by the external catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundProfile {
    pub id: String,
    pub name: String,
    /// Top-level peer category, e.g. "Equity", "Debt", "Hybrid".
    pub category: String,
    /// Finer peer bucket, e.g. "Large Cap", "Flexi Cap", "Liquid".
    pub sub_category: Option<String>,
    /// Annual expense ratio in percent.
    pub expense_ratio: Option<Decimal>,
    /// Assets under management, in the catalog's reporting unit (crores).
    pub aum: Option<Decimal>,
    pub inception_date: Option<NaiveDate>,
}

/// One line of a portfolio definition: a fund and its target weight in
/// percent. Weights are expected to sum to 100 but the simulator normalizes
/// against whatever sum is supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationTarget {
    pub fund_id: String,
    pub target_weight: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(points: &[(NaiveDate, Decimal)]) -> NavSeries {
        points
            .iter()
            .map(|&(date, nav)| NavPoint { date, nav })
            .collect()
    }

    #[test]
    fn new_sorts_and_dedups() {
        let s = series(&[
            (d(2024, 1, 3), dec!(102)),
            (d(2024, 1, 1), dec!(100)),
            (d(2024, 1, 3), dec!(103)),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.last().unwrap().nav, dec!(103));
    }

    #[test]
    fn resolve_prefers_exact_then_before_then_after() {
        let s = series(&[
            (d(2024, 1, 1), dec!(100)),
            (d(2024, 1, 5), dec!(105)),
            (d(2024, 1, 9), dec!(109)),
        ]);
        assert_eq!(s.resolve_nav(d(2024, 1, 5)).unwrap().nav, dec!(105));
        assert_eq!(s.resolve_nav(d(2024, 1, 7)).unwrap().nav, dec!(105));
        // Before the first point, falls forward to the earliest one.
        assert_eq!(s.resolve_nav(d(2023, 12, 25)).unwrap().nav, dec!(100));
        assert!(NavSeries::default().resolve_nav(d(2024, 1, 1)).is_none());
    }

    #[test]
    fn window_is_inclusive() {
        let s = series(&[
            (d(2024, 1, 1), dec!(100)),
            (d(2024, 1, 5), dec!(105)),
            (d(2024, 1, 9), dec!(109)),
        ]);
        let w = s.window(d(2024, 1, 5), d(2024, 1, 9));
        assert_eq!(w.len(), 2);
        assert_eq!(w.first().unwrap().date, d(2024, 1, 5));
    }
}
