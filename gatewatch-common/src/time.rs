//! Date helpers for daily summaries

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC calendar date, the key space for daily summaries
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The `window_days` most recent dates up to and including `today`,
/// in chronological order. A window of 0 yields an empty vec.
pub fn trailing_window(today: NaiveDate, window_days: u32) -> Vec<NaiveDate> {
    (0..window_days)
        .rev()
        .map(|back| today - chrono::Days::new(back as u64))
        .collect()
}
