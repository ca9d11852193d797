// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.

use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, Utc};

/// Naive layouts the desktop collector writes (local log lines carry no offset).
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Format a UTC timestamp as RFC3339 with millisecond precision and a `Z` suffix.
///
/// For years 0000 through 9999 (see [`is_fixed_width_year`]) the output is
/// fixed-width, so string order matches chronological order.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether `date` formats with a four-digit year. Other years gain a sign
/// and extra digits, which breaks string ordering and RFC3339 parsing.
pub fn is_fixed_width_year(date: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&date.year())
}

/// Parse a client-supplied event timestamp.
///
/// Accepts RFC3339 with any offset, or a naive date-time which is taken as UTC.
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Convert epoch milliseconds to a UTC timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
