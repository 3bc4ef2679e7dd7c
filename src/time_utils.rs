// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date formatting and the MM/DD/YYYY form fields.

use chrono::{DateTime, Datelike, Local, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Today's local date in MM/DD/YYYY format (issue-date default).
pub fn today_mmddyyyy() -> String {
    let today = Local::now().date_naive();
    format!(
        "{:02}/{:02}/{}",
        today.month(),
        today.day(),
        today.year()
    )
}

/// Incrementally mask free-text date input as MM/DD/YYYY.
///
/// Non-digits are stripped, the digits are truncated to 8 (MMDDYYYY), and
/// slashes are inserted as the user types: "1" -> "1", "121" -> "12/1",
/// "12152024extra" -> "12/15/2024".
pub fn format_date_input(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).take(8).collect();

    match digits.len() {
        0 => String::new(),
        1..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        _ => format!("{}/{}/{}", &digits[..2], &digits[2..4], &digits[4..]),
    }
}

/// Strictly parse an MM/DD/YYYY string into a calendar date.
///
/// Unlike the lenient parsers some frontends use, out-of-range components
/// (month 13, day 40) are rejected rather than rolled into the next period.
pub fn parse_mmddyyyy(value: &str) -> Option<NaiveDate> {
    let mut parts = value.split('/');
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
