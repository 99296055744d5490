use chrono::{Months, NaiveDate};

/// Inclusive list of every calendar day between `start` and `end`.
pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            // Should not happen for typical date ranges
            break;
        }
    }
    days
}

/// Dates stepped forward from `start` by `interval_days` until `end`
/// (inclusive of `start`, exclusive of anything past `end`).
pub fn periodic_dates(start: NaiveDate, end: NaiveDate, interval_days: i64) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    if start > end || interval_days <= 0 {
        return dates;
    }
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += chrono::Duration::days(interval_days);
    }
    dates
}

/// Steps a date forward by whole calendar months, clamping to the last day
/// of shorter months (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Elapsed years between two dates using the 365-day convention.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / crate::constants::DAYS_PER_YEAR
}
