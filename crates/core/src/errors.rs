//! Core error types for the FundLens analytics engine.
//!
//! This module defines provider-agnostic error types. Provider-specific
//! failures (HTTP, storage, etc.) are converted to these types by the
//! integration layer before they reach the engines.

use chrono::NaiveDate;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the analytics core.
///
/// Errors local to one fund (scoring) or one allocation line (simulation)
/// are caught by the engines and degrade that unit's contribution; the
/// variants below are the ones that propagate to callers.
#[derive(Error, Debug)]
pub enum Error {
    /// The primary subject of a computation has too little NAV history.
    /// Fatal to that computation; never zero-filled.
    #[error("Insufficient NAV history for {fund_id}: {available} points available, {required} required")]
    InsufficientData {
        fund_id: String,
        available: usize,
        required: usize,
    },

    /// The benchmark series is empty or unavailable for the requested window.
    /// Benchmark-relative outputs are omitted, never fabricated.
    #[error("No benchmark data for index '{0}' in the requested window")]
    NoBenchmarkData(String),

    /// A fund required for the initial backtest allocation has no resolvable
    /// NAV at the start date. Fatal to that backtest run.
    #[error("No NAV resolvable for fund {fund_id} at backtest start {start_date}")]
    NoInitialNav {
        fund_id: String,
        start_date: NaiveDate,
    },

    /// Start date is not strictly before end date. Surfaced immediately,
    /// never retried.
    #[error("Invalid date range: start {start} must be strictly before end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Fund not found: {0}")]
    FundNotFound(String),

    #[error("No portfolio definition resolvable for '{0}'")]
    PortfolioNotFound(String),

    /// An external data provider failed in a way the core cannot degrade
    /// around. Retry/backoff belongs to the provider integration, not here.
    #[error("Market data provider error: {0}")]
    Provider(String),

    /// A score/result sink rejected a write. Emission is fire-and-forget
    /// relative to the computed value, so this is surfaced via logs and
    /// batch summaries rather than voiding results.
    #[error("Result sink error: {0}")]
    Sink(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
