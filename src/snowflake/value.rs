//! Rendering of SQL API cell values.
//!
//! The SQL API returns every cell as a string, but temporal types arrive in
//! their wire encoding (`date` as days since the epoch, timestamps as
//! `seconds.nanoseconds`). They are rendered here the way a driver would
//! print them; everything else passes through untouched.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

const NANOS_PER_SEC: u32 = 1_000_000_000;
/// `timestamp_tz` offsets are sent as minutes shifted by this amount.
const TZ_OFFSET_BIAS_MINUTES: i32 = 1440;

/// Renders one raw cell according to its column type.
///
/// Values that do not parse in the expected encoding are returned as-is.
pub fn render(type_name: Option<&str>, raw: &str) -> String {
    let Some(type_name) = type_name else {
        return raw.to_string();
    };

    let rendered = match type_name.to_ascii_lowercase().as_str() {
        "date" => render_date(raw),
        "time" => render_time(raw),
        "timestamp_ntz" => epoch(raw).map(|dt| format_naive(&dt)),
        "timestamp_ltz" => epoch(raw).map(|dt| format_offset(&dt.and_utc().fixed_offset())),
        "timestamp_tz" => render_timestamp_tz(raw),
        _ => return raw.to_string(),
    };

    rendered.unwrap_or_else(|| {
        debug!(%type_name, value = raw, "Leaving unrecognised temporal value as sent");
        raw.to_string()
    })
}

fn render_date(raw: &str) -> Option<String> {
    let days: i64 = raw.trim().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days))?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn render_time(raw: &str) -> Option<String> {
    let (secs, nanos) = split_seconds(raw)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(secs).ok()?, nanos)?;
    Some(with_fraction(time.format("%H:%M:%S").to_string(), time.nanosecond()))
}

fn render_timestamp_tz(raw: &str) -> Option<String> {
    let (value, offset) = raw.trim().split_once(' ')?;
    let minutes: i32 = offset.parse().ok()?;
    let offset = FixedOffset::east_opt((minutes - TZ_OFFSET_BIAS_MINUTES) * 60)?;
    let utc = epoch(value)?.and_utc();
    Some(format_offset(&utc.with_timezone(&offset)))
}

/// Parses `seconds[.fraction]` since the Unix epoch.
fn epoch(raw: &str) -> Option<NaiveDateTime> {
    let (secs, nanos) = split_seconds(raw)?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

/// Splits `-12.5` into whole seconds and non-negative nanoseconds (`-13`, `500_000_000`).
fn split_seconds(raw: &str) -> Option<(i64, u32)> {
    let raw = raw.trim();
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let mut secs: i64 = whole.parse().ok()?;

    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<9}", fraction).parse().ok()?
    };

    if whole.starts_with('-') && nanos > 0 {
        secs -= 1;
        nanos = NANOS_PER_SEC - nanos;
    }
    Some((secs, nanos))
}

fn format_naive(dt: &NaiveDateTime) -> String {
    with_fraction(dt.format("%Y-%m-%d %H:%M:%S").to_string(), dt.nanosecond())
}

fn format_offset(dt: &DateTime<FixedOffset>) -> String {
    let mut text = format_naive(&dt.naive_local());
    text.push_str(&dt.format("%:z").to_string());
    text
}

// Microsecond precision, printed only when non-zero.
fn with_fraction(mut text: String, nanos: u32) -> String {
    let micros = nanos / 1_000;
    if micros > 0 {
        text.push_str(&format!(".{:06}", micros));
    }
    text
}
