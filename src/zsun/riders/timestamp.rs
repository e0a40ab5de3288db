//! Heuristic timestamp decoding for the encodings emitted by upstream
//! providers.
//!
//! No format tag is transmitted, so the decoder works purely from the shape
//! and magnitude of the raw value. Precedence:
//!
//! 1. an already decoded instant is returned unchanged;
//! 2. a wrapped token `/Date(<integer>[+-hhmm])/` is unwrapped and decoded
//!    numerically;
//! 3. an integer (or integer-looking string) is decoded by magnitude:
//!    above `1e14` it counts 100ns ticks since 0001-01-01, below `1e11` it
//!    counts Unix seconds, anything in between is Unix milliseconds;
//! 4. an ISO-8601-like string (`YYYY-MM-DD[( |T)hh:mm[:ss[.fff]]][Z|±hh:mm|±hhmm]`);
//! 5. a handful of common calendar layouts, then the default.
//!
//! The magnitude thresholds are fixed; historical data was produced under
//! exactly these rules.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;

use crate::zsun::riders::coerce::is_integer_literal;

/// Magnitude above which a number is read as 100ns ticks.
pub const TICKS_THRESHOLD: f64 = 1e14;
/// Magnitude below which a number is read as Unix seconds.
pub const SECONDS_THRESHOLD: f64 = 1e11;
/// Tick count at 1970-01-01T00:00:00Z.
pub const TICKS_AT_UNIX_EPOCH: f64 = 621_355_968_000_000_000.0;
const TICKS_PER_MILLISECOND: f64 = 10_000.0;
/// Largest representable offset from the Unix epoch, in milliseconds.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d %b %Y %H:%M:%S",
];
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y", "%b %d %Y"];

fn wrapped_ticks_re() -> &'static Regex {
    static WRAPPED_RE: OnceLock<Regex> = OnceLock::new();
    WRAPPED_RE.get_or_init(|| {
        Regex::new(r"^/Date\((-?\d+)(?:[+-]\d{4})?\)/$").expect("valid wrapped date regex")
    })
}

fn iso_like_re() -> &'static Regex {
    static ISO_RE: OnceLock<Regex> = OnceLock::new();
    ISO_RE.get_or_init(|| {
        Regex::new(
            r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?(?:Z|[+-]\d{2}:\d{2}|[+-]\d{4})?$",
        )
        .expect("valid ISO-8601 regex")
    })
}

fn iso_parts_re() -> &'static Regex {
    static PARTS_RE: OnceLock<Regex> = OnceLock::new();
    PARTS_RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?(Z|[+-]\d{2}:\d{2})?$",
        )
        .expect("valid ISO-8601 parts regex")
    })
}

fn bare_offset_re() -> &'static Regex {
    static OFFSET_RE: OnceLock<Regex> = OnceLock::new();
    OFFSET_RE
        .get_or_init(|| Regex::new(r"([+-]\d{2})(\d{2})$").expect("valid offset regex"))
}

/// The instant used when neither the raw value nor the caller supplies one.
pub fn epoch_sentinel() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Anything the decoder can turn into an instant.
pub trait TimestampSource {
    /// Decodes `self`, falling back to `default` (or the epoch sentinel).
    fn decode_timestamp(&self, default: Option<DateTime<Utc>>) -> DateTime<Utc>;
}

impl TimestampSource for DateTime<Utc> {
    fn decode_timestamp(&self, _default: Option<DateTime<Utc>>) -> DateTime<Utc> {
        *self
    }
}

impl TimestampSource for str {
    fn decode_timestamp(&self, default: Option<DateTime<Utc>>) -> DateTime<Utc> {
        decode_text(self).unwrap_or_else(|| default.unwrap_or_else(epoch_sentinel))
    }
}

impl TimestampSource for Value {
    fn decode_timestamp(&self, default: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let decoded = match self {
            Value::String(text) => decode_text(text),
            Value::Number(number) => number.as_f64().and_then(numeric_to_timestamp),
            _ => None,
        };
        decoded.unwrap_or_else(|| default.unwrap_or_else(epoch_sentinel))
    }
}

/// Decodes `raw` into an instant, returning `default` (or the epoch
/// sentinel when no default is given) when nothing matches.
pub fn decode<T: TimestampSource + ?Sized>(raw: &T, default: Option<DateTime<Utc>>) -> DateTime<Utc> {
    raw.decode_timestamp(default)
}

/// Applies the magnitude heuristic to a bare number.
pub fn numeric_to_timestamp(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let magnitude = value.abs();
    let millis = if magnitude > TICKS_THRESHOLD {
        ((value - TICKS_AT_UNIX_EPOCH) / TICKS_PER_MILLISECOND).floor()
    } else if magnitude < SECONDS_THRESHOLD {
        (value * 1000.0).floor()
    } else {
        value.floor()
    };
    millis_to_timestamp(millis)
}

/// Converts a count of 100ns ticks since 0001-01-01 into an instant.
pub fn from_ticks(ticks: f64) -> Option<DateTime<Utc>> {
    if !ticks.is_finite() {
        return None;
    }
    millis_to_timestamp(((ticks - TICKS_AT_UNIX_EPOCH) / TICKS_PER_MILLISECOND).floor())
}

/// Formats an instant the way it is persisted: ISO-8601 UTC with
/// millisecond precision.
pub fn to_iso_string(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn millis_to_timestamp(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
}

fn decode_text(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(captures) = wrapped_ticks_re().captures(trimmed) {
        return captures[1].parse::<f64>().ok().and_then(numeric_to_timestamp);
    }

    if is_integer_literal(trimmed) {
        return trimmed.parse::<f64>().ok().and_then(numeric_to_timestamp);
    }

    if iso_like_re().is_match(trimmed) {
        let normalized = bare_offset_re().replace(trimmed, "$1:$2");
        if let Some(instant) = parse_iso_parts(&normalized) {
            return Some(instant);
        }
    }

    parse_calendar_fallback(trimmed)
}

fn parse_iso_parts(text: &str) -> Option<DateTime<Utc>> {
    let captures = iso_parts_re().captures(text)?;
    let number = |index: usize| -> Option<u32> {
        match captures.get(index) {
            Some(group) => group.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year: i32 = captures[1].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)?;
    let nanos = captures
        .get(7)
        .map(|fraction| fraction_to_nanos(fraction.as_str()))
        .unwrap_or(0);
    let naive = date.and_hms_nano_opt(number(4)?, number(5)?, number(6)?, nanos)?;

    let offset = match captures.get(8).map(|group| group.as_str()) {
        None | Some("Z") => FixedOffset::east_opt(0)?,
        Some(offset) => parse_offset(offset)?,
    };
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
}

fn fraction_to_nanos(fraction: &str) -> u32 {
    let mut digits: String = fraction.chars().take(9).collect();
    while digits.len() < 9 {
        digits.push('0');
    }
    digits.parse().unwrap_or(0)
}

fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let (hours, minutes) = offset.get(1..)?.split_once(':')?;
    let seconds = hours.parse::<i32>().ok()? * 3600 + minutes.parse::<i32>().ok()? * 60;
    FixedOffset::east_opt(sign * seconds)
}

fn parse_calendar_fallback(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn utc(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text)
            .expect("valid RFC 3339 literal")
            .with_timezone(&Utc)
    }

    #[test]
    fn seconds_and_milliseconds_land_on_the_same_instant() {
        let seconds = decode(&json!(1_700_000_000), None);
        let millis = decode(&json!(1_700_000_000_000_i64), None);
        assert_eq!(seconds, millis);
        assert_eq!(seconds, utc("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn ticks_decode_to_a_21st_century_date() {
        let decoded = decode(&json!(637_700_000_000_000_000_i64), None);
        assert!((2000..2100).contains(&decoded.year()), "{decoded}");
        assert_eq!(decoded.year(), 2021);
        assert_eq!(decoded.month(), 10);
    }

    #[test]
    fn ticks_at_unix_epoch_are_the_epoch() {
        assert_eq!(from_ticks(TICKS_AT_UNIX_EPOCH), Some(epoch_sentinel()));
        assert_eq!(decode("621355968000000000", None), epoch_sentinel());
    }

    #[test]
    fn wrapped_tokens_are_unwrapped() {
        let decoded = decode("/Date(1700000000000)/", None);
        assert_eq!(decoded, utc("2023-11-14T22:13:20Z"));
        let with_offset = decode(&json!("/Date(1700000000000+0200)/"), None);
        assert_eq!(with_offset, decoded);
    }

    #[test]
    fn integer_strings_use_the_numeric_heuristic() {
        assert_eq!(decode(" 1700000000 ", None), utc("2023-11-14T22:13:20Z"));
        assert_eq!(decode("-86400", None), utc("1969-12-31T00:00:00Z"));
    }

    #[test]
    fn iso_strings_with_and_without_colon_offsets() {
        let expected = utc("2024-03-01T08:30:00Z");
        assert_eq!(decode("2024-03-01T10:30:00+0200", None), expected);
        assert_eq!(decode("2024-03-01T10:30:00+02:00", None), expected);
        assert_eq!(decode("2024-03-01 08:30:00Z", None), expected);
        assert_eq!(decode("2024-03-01T08:30", None), expected);
        assert_eq!(decode("2024-03-01", None), utc("2024-03-01T00:00:00Z"));

        let fractional = decode("2024-03-01T08:30:00.250Z", None);
        assert_eq!(fractional.nanosecond(), 250_000_000);
    }

    #[test]
    fn calendar_fallbacks() {
        assert_eq!(
            decode("Fri, 01 Mar 2024 08:30:00 +0000", None),
            utc("2024-03-01T08:30:00Z")
        );
        assert_eq!(decode("2024/03/01", None), utc("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn unparseable_values_fall_back_to_default_or_epoch() {
        let default = utc("2020-01-01T00:00:00Z");
        assert_eq!(decode("not a date", Some(default)), default);
        assert_eq!(decode("2024-13-45", Some(default)), default);
        assert_eq!(decode(&json!(true), Some(default)), default);
        assert_eq!(decode(&Value::Null, None), epoch_sentinel());
        assert_eq!(decode("   ", None), epoch_sentinel());
    }

    #[test]
    fn decoded_instants_pass_through() {
        let instant = utc("2022-06-30T12:00:00Z");
        assert_eq!(decode(&instant, None), instant);
    }

    #[test]
    fn iso_string_round_trips() {
        let instant = utc("2023-11-14T22:13:20.123Z");
        let text = to_iso_string(&instant);
        assert_eq!(text, "2023-11-14T22:13:20.123Z");
        assert_eq!(decode(text.as_str(), None), instant);
    }
}
