use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::market_data::AllocationTarget;

/// Days between sampled evaluation dates in calendar-rebalanced runs.
/// Portfolio value and drawdown are only observed at these key dates, so
/// intraperiod extrema between samples are not captured; the threshold
/// variant evaluates every calendar day instead.
pub const KEY_DATE_INTERVAL_DAYS: i64 = 7;

/// Tolerance when matching an evaluation date to a scheduled rebalance date.
pub const REBALANCE_DATE_TOLERANCE_DAYS: i64 = 1;

/// Fixed horizon for stress-test simulations.
pub const STRESS_TEST_HORIZON_DAYS: i64 = 90;

/// Lookback pad when prefetching NAV series so the start date resolves to
/// an at-or-before point over weekends and holidays.
pub const NAV_LOOKBACK_PAD_DAYS: i64 = 7;

/// Upper bound on concurrent runs in a threshold sweep.
pub const MAX_CONCURRENT_BACKTESTS: usize = 4;

/// Built-in fallback allocations per risk-profile label, used when the
/// portfolio source has no concrete definition for the profile.
pub fn default_risk_profile_allocations(risk_profile: &str) -> Option<Vec<AllocationTarget>> {
    let table: &[(&str, Decimal)] = match risk_profile.to_ascii_lowercase().as_str() {
        "conservative" => &[
            ("hdfc-short-duration-debt", dec!(40)),
            ("icici-corporate-bond", dec!(30)),
            ("hdfc-top-100", dec!(20)),
            ("sbi-liquid", dec!(10)),
        ],
        "balanced" => &[
            ("hdfc-top-100", dec!(30)),
            ("parag-parikh-flexi-cap", dec!(25)),
            ("icici-corporate-bond", dec!(30)),
            ("sbi-liquid", dec!(15)),
        ],
        "moderate" => &[
            ("hdfc-top-100", dec!(35)),
            ("parag-parikh-flexi-cap", dec!(30)),
            ("motilal-midcap", dec!(15)),
            ("icici-corporate-bond", dec!(20)),
        ],
        "aggressive" => &[
            ("nippon-small-cap", dec!(30)),
            ("motilal-midcap", dec!(30)),
            ("parag-parikh-flexi-cap", dec!(25)),
            ("hdfc-top-100", dec!(15)),
        ],
        _ => return None,
    };
    Some(
        table
            .iter()
            .map(|&(fund_id, target_weight)| AllocationTarget {
                fund_id: fund_id.to_string(),
                target_weight,
            })
            .collect(),
    )
}
