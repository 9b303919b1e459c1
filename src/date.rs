//! Date normalization for display
//!
//! Capture dates arrive as EXIF colon dates (`2023:06:15 14:34:22`), ISO-8601
//! strings with or without an offset, RFC 2822 strings from mail-style
//! containers, or epoch numbers from filesystem stats. Everything is reduced
//! to a wall-clock `NaiveDateTime` and rendered with one long-form template.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Long-form display template, e.g. "June 15, 2023 at 2:34 PM"
pub const DISPLAY_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

static TZ_OFFSET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]\d{2}:?\d{2}$").unwrap());

static EXIF_COLON_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}):(\d{2}):(\d{2})[ T](\d{2}):(\d{2}):(\d{2})").unwrap()
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y:%m:%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y:%m:%d"];

/// Epoch values above this are milliseconds, not seconds
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Render a raw date string for display
///
/// Never fails: input that cannot be parsed is returned unchanged rather than
/// replaced by a placeholder.
pub fn format_date_time(raw: &str) -> String {
    match parse_date_time(raw) {
        Some(dt) => render(&dt),
        None => raw.to_string(),
    }
}

/// Render an already-parsed instant with [`DISPLAY_FORMAT`]
pub fn render(dt: &NaiveDateTime) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

/// Parse a raw date string into a wall-clock instant
///
/// A trailing `±HH:MM` or `±HHMM` offset is dropped, as is a `Z` suffix: the time is
/// shown as recorded rather than shifted into another zone.
// TODO: keep the stripped offset and show it next to the time once the
// presentation layer has a slot for it.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_offset = TZ_OFFSET_SUFFIX.replace(trimmed, "");
    let candidate = without_offset
        .trim_end_matches(['Z', 'z'])
        .trim_end();

    if let Some(caps) = EXIF_COLON_DATE.captures(candidate) {
        return exif_components(&caps);
    }

    parse_generic(candidate).or_else(|| {
        DateTime::parse_from_rfc2822(trimmed)
            .ok()
            .map(|dt| dt.naive_local())
    })
}

/// Parse a tree value that may be a date string or an epoch number
pub fn parse_date_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_time(s),
        Value::Number(n) => {
            let epoch = n.as_f64()?;
            let millis = if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                epoch
            } else {
                epoch * 1000.0
            };
            DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

fn exif_components(caps: &regex::Captures<'_>) -> Option<NaiveDateTime> {
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, part(2)?, part(3)?)?.and_hms_opt(part(4)?, part(5)?, part(6)?)
}

fn parse_generic(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
