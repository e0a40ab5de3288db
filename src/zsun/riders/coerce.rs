//! Total conversions from raw JSON values to the scalar types used by the
//! canonical rider model.
//!
//! Every function takes the raw value plus a default and always returns a
//! value of the declared type. Nothing here fails: a value that cannot be
//! interpreted resolves to the supplied default.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Returns the trimmed string when `value` is a non-blank string, otherwise
/// `default`.
pub fn to_text(value: &Value, default: &str) -> String {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        _ => default.to_string(),
    }
}

/// Converts numbers and numeric strings to `f64`. Objects, arrays, booleans
/// and `null` are rejected outright, as is anything that does not parse to a
/// finite number.
///
/// Strings are read up to the end of their leading numeric literal, so
/// `"61.5 kg"` yields `61.5`.
pub fn to_float(value: &Value, default: f64) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_float(text),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => number,
        _ => default,
    }
}

/// Converts numbers and numeric strings to `i64`.
///
/// Fractional numbers are truncated toward zero. Strings are read up to the
/// first non-digit after an optional sign, so `"42 kg"` yields `42` while
/// `"kg"` yields `default`.
pub fn to_int(value: &Value, default: i64) -> i64 {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return int;
            }
            match number.as_f64() {
                Some(float) if float.is_finite() => float_to_int(float.trunc()).unwrap_or(default),
                _ => default,
            }
        }
        Value::String(text) => leading_integer(text).unwrap_or(default),
        _ => default,
    }
}

/// Converts booleans, numbers and a fixed vocabulary of string tokens to
/// `bool`.
///
/// Recognized tokens (case-insensitive, surrounding whitespace ignored):
/// `true/false`, `1/0`, `yes/no`, `y/n`, `on/off`. Other integer strings are
/// `true` when non-zero.
pub fn to_boolean(value: &Value, default: bool) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(default),
        Value::String(text) => {
            let token = text.trim().to_ascii_lowercase();
            match token.as_str() {
                "" => default,
                "true" | "1" | "yes" | "y" | "on" => true,
                "false" | "0" | "no" | "n" | "off" => false,
                other if is_integer_literal(other) => {
                    other.trim_start_matches('-').bytes().any(|b| b != b'0')
                }
                _ => default,
            }
        }
        _ => default,
    }
}

/// Returns true for strings of the form `-?\d+`.
pub(crate) fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn leading_float_re() -> &'static Regex {
    static FLOAT_RE: OnceLock<Regex> = OnceLock::new();
    FLOAT_RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
    })
}

fn leading_float(text: &str) -> Option<f64> {
    let literal = leading_float_re().find(text.trim_start())?;
    literal.as_str().parse().ok()
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digit_count = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digit_count].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn float_to_int(value: f64) -> Option<i64> {
    if value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_is_trimmed_and_defaults_on_non_strings() {
        assert_eq!(to_text(&json!("  Alice Smith "), ""), "Alice Smith");
        assert_eq!(to_text(&json!("   "), "n/a"), "n/a");
        assert_eq!(to_text(&json!(42), "n/a"), "n/a");
        assert_eq!(to_text(&Value::Null, ""), "");
    }

    #[test]
    fn float_rejects_objects_booleans_and_non_finite() {
        assert_eq!(to_float(&json!(72.5), 0.0), 72.5);
        assert_eq!(to_float(&json!(" 68.25 "), 0.0), 68.25);
        assert_eq!(to_float(&json!("1e3"), 0.0), 1000.0);
        assert_eq!(to_float(&json!(true), -1.0), -1.0);
        assert_eq!(to_float(&json!({"value": 1}), -1.0), -1.0);
        assert_eq!(to_float(&json!([1.0]), -1.0), -1.0);
        assert_eq!(to_float(&Value::Null, -1.0), -1.0);
        assert_eq!(to_float(&json!(""), -1.0), -1.0);
        assert_eq!(to_float(&json!("heavy"), -1.0), -1.0);
        assert_eq!(to_float(&json!("kg 61.5"), -1.0), -1.0);
        assert_eq!(to_float(&json!("inf"), -1.0), -1.0);
        assert_eq!(to_float(&json!("NaN"), -1.0), -1.0);
    }

    #[test]
    fn float_reads_the_leading_numeric_literal() {
        assert_eq!(to_float(&json!("61.5 kg"), -1.0), 61.5);
        assert_eq!(to_float(&json!(".5"), -1.0), 0.5);
        assert_eq!(to_float(&json!("-2.5e2W"), -1.0), -250.0);
        assert_eq!(to_float(&json!("7e"), -1.0), 7.0);
        assert_eq!(to_float(&json!("+3."), -1.0), 3.0);
        assert_eq!(to_float(&json!("1e400"), -1.0), -1.0);
        assert_eq!(to_float(&json!("."), -1.0), -1.0);
    }

    #[test]
    fn int_truncates_and_reads_leading_digits() {
        assert_eq!(to_int(&json!(41), 0), 41);
        assert_eq!(to_int(&json!(41.9), 0), 41);
        assert_eq!(to_int(&json!(-3.7), 0), -3);
        assert_eq!(to_int(&json!("  27 years"), 0), 27);
        assert_eq!(to_int(&json!("-12"), 0), -12);
        assert_eq!(to_int(&json!("12.9"), 0), 12);
        assert_eq!(to_int(&json!("years"), 9), 9);
        assert_eq!(to_int(&json!(false), 9), 9);
        assert_eq!(to_int(&json!(1e300), 9), 9);
    }

    #[test]
    fn boolean_vocabulary() {
        assert!(to_boolean(&json!("YES"), false));
        assert!(!to_boolean(&json!("0"), true));
        assert!(!to_boolean(&json!(""), false));
        assert!(to_boolean(&json!(" On "), false));
        assert!(!to_boolean(&json!("n"), true));
        assert!(to_boolean(&json!("-7"), false));
        assert!(!to_boolean(&json!("000"), true));
        assert!(to_boolean(&json!(true), false));
        assert!(!to_boolean(&json!(0), true));
        assert!(to_boolean(&json!(2.5), false));
        assert!(to_boolean(&json!("maybe"), true));
        assert!(!to_boolean(&json!({"flag": true}), false));
    }
}
