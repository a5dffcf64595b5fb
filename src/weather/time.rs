//! Time and timezone resolution for the weather join.
//!
//! All day keys derived from instants go through a real IANA timezone
//! conversion; a UTC string is never split at the `T`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::DEFAULT_TIMEZONE;
use crate::error::ReportError;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Target time used when a day has no timed entries.
pub const LOCAL_NOON_MINUTES: i64 = 12 * 60;

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, ReportError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ReportError::InvalidTimezone(name.to_string()))
}

/// Resolves the caller's timezone, degrading to the default zone instead of failing.
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => DEFAULT_TIMEZONE,
    };
    parse_timezone(name).unwrap_or_else(|_| {
        tracing::warn!(timezone = name, fallback = DEFAULT_TIMEZONE, "Unknown timezone, using default");
        chrono_tz::Europe::Berlin
    })
}

/// Permissive time-of-day parser: `H:MM`, `HH:MM`, `HH:MM:SS`.
/// `24:00` clamps to `23:59`. Returns minutes since midnight.
pub fn parse_time_of_day(raw: &str) -> Option<i64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let field = |s: &str, max_len: usize| -> Option<i64> {
        if s.is_empty() || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok()
    };

    let hour = field(parts[0], 2)?;
    if parts[1].len() != 2 {
        return None;
    }
    let minute = field(parts[1], 2)?;
    let second = match parts.get(2) {
        Some(s) if s.len() == 2 => field(s, 2)?,
        Some(_) => return None,
        None => 0,
    };

    if hour == 24 && minute == 0 && second == 0 {
        return Some(MINUTES_PER_DAY - 1);
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Parses a timestamp into an instant. Strings without an offset are read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Wall-clock date and time of an instant in `tz`.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// Local `YYYY-MM-DD` of a timestamp string in `tz`.
pub fn local_day_key(raw: &str, tz: Tz) -> Option<String> {
    parse_instant(raw).map(|instant| to_local(instant, tz).format("%Y-%m-%d").to_string())
}

/// Accepts `YYYY-MM-DD` or a longer string starting with it (e.g. a timestamp column).
pub fn date_prefix(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let prefix = raw.get(..10)?;
    let bytes = prefix.as_bytes();
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    shape_ok.then_some(prefix)
}

/// Minutes between local midnight of `day` and the local time of `instant`.
/// Negative or beyond one day when the instant falls on a neighboring date.
pub fn minutes_from_day_start(day: &str, instant: DateTime<Utc>, tz: Tz) -> Option<i64> {
    let day_start = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)?;
    Some((to_local(instant, tz) - day_start).num_minutes())
}

/// Local minutes since midnight, only when the instant falls on `day` locally.
pub fn minutes_on_day(day: &str, instant: DateTime<Utc>, tz: Tz) -> Option<i64> {
    let local = to_local(instant, tz);
    (local.format("%Y-%m-%d").to_string() == day)
        .then(|| i64::from(local.hour()) * 60 + i64::from(local.minute()))
}
