/// Trading days per year, used to annualize daily-return statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year, used to annualize point returns over windows.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Annual risk-free rate in percent (10-year G-Sec yield assumption) used
/// for Sharpe/Sortino when the caller does not supply one.
pub const DEFAULT_RISK_FREE_RATE: f64 = 6.5;

/// Sortino ratio reported when a series has no sub-threshold returns.
/// Treated as maximally favorable rather than a divide-by-zero fault.
pub const SORTINO_NO_DOWNSIDE: f64 = 99.99;
