//! Display formatting for sizes, times and amounts.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Size in kilobytes with one decimal, e.g. `"12.5 KB"`.
#[allow(clippy::cast_precision_loss)]
pub fn file_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Wall-clock time of a message in `tz`; empty when the server sent none.
pub fn clock_time<Tz>(timestamp: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.map_or_else(String::new, |ts| ts.with_timezone(tz).format("%H:%M").to_string())
}

/// Message time in the browser's local zone.
pub fn local_clock_time(timestamp: Option<DateTime<Utc>>) -> String {
    clock_time(timestamp, &chrono::Local)
}

pub fn member_since(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "Unknown".to_owned(), |d| d.format("%b %-d, %Y").to_string())
}

/// Amount given in the currency's minor unit, e.g. `"INR 1.00"`.
pub fn amount(minor_units: u64, currency: &str) -> String {
    let label = if currency.is_empty() { "INR" } else { currency };
    format!("{label} {}.{:02}", minor_units / 100, minor_units % 100)
}
