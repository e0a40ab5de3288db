use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::zsun::riders::timestamp::{self, TimestampSource};

pub mod fields;

pub use fields::{ID_FIELD, NAME_FIELD, RIDER_FIELDS, column_headers, column_order, field_index};

/// Platform identifier of a rider. It is kept as the decimal string the
/// upstream providers use for dictionary keys.
pub type RiderId = String;

/// Semantic type tag driving coercion of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Non-empty platform identifier; strings or integral numbers.
    Identifier,
    /// Non-empty human-readable name.
    DisplayName,
    /// Free text.
    Text,
    /// Short category label such as a gender code or racing category.
    Category,
    /// Floating point measurement.
    Float,
    /// Integer count or score.
    Int,
    /// Point in time.
    Timestamp,
}

/// Declared default of a field, used whenever resolution or coercion fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Text(&'static str),
    Float(f64),
    Int(i64),
    /// The timestamp decoder's epoch sentinel.
    Epoch,
}

impl FieldDefault {
    pub fn to_value(self) -> FieldValue {
        match self {
            FieldDefault::Text(text) => FieldValue::Text(text.to_string()),
            FieldDefault::Float(value) => FieldValue::Float(value),
            FieldDefault::Int(value) => FieldValue::Int(value),
            FieldDefault::Epoch => FieldValue::Timestamp(timestamp::epoch_sentinel()),
        }
    }
}

/// One row of the canonical field table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Canonical field name.
    pub name: &'static str,
    /// Column header used when the field is written to a sheet.
    pub header: &'static str,
    /// Accepted raw keys; the first one is the preferred key used on encode.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub fn preferred_alias(&self) -> &'static str {
        self.aliases[0]
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(value) => Some(*value),
            FieldValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    /// Converts the value into the JSON representation used when entities
    /// are re-serialized. Timestamps become ISO-8601 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(text) => serde_json::Value::String(text.clone()),
            FieldValue::Float(value) => serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Int(value) => serde_json::Value::from(*value),
            FieldValue::Timestamp(value) => {
                serde_json::Value::String(timestamp::to_iso_string(value))
            }
        }
    }
}

/// A scalar cell as read from or written to a tabular destination.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    /// Returns the form a destination adapter persists: timestamps become
    /// ISO-8601 strings, everything else is unchanged.
    pub fn into_persisted(self) -> CellValue {
        match self {
            CellValue::Timestamp(instant) => CellValue::Text(timestamp::to_iso_string(&instant)),
            other => other,
        }
    }

    /// Reads the cell as a rider identifier.
    ///
    /// Text is trimmed and must be digits only; numbers must be
    /// non-negative integers. Anything else is not a key.
    pub fn as_rider_key(&self) -> Option<RiderId> {
        match self {
            CellValue::Text(text) => {
                let trimmed = text.trim();
                is_rider_id(trimmed).then(|| trimmed.to_string())
            }
            CellValue::Int(value) if *value >= 0 => Some(value.to_string()),
            CellValue::Float(value)
                if value.is_finite() && *value >= 0.0 && value.fract() == 0.0 =>
            {
                Some(format!("{value:.0}"))
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&FieldValue> for CellValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => CellValue::Text(text.clone()),
            FieldValue::Float(value) => CellValue::Float(*value),
            FieldValue::Int(value) => CellValue::Int(*value),
            FieldValue::Timestamp(value) => CellValue::Timestamp(*value),
        }
    }
}

impl TimestampSource for CellValue {
    fn decode_timestamp(&self, default: Option<DateTime<Utc>>) -> DateTime<Utc> {
        match self {
            CellValue::Timestamp(instant) => *instant,
            CellValue::Text(text) => text.as_str().decode_timestamp(default),
            CellValue::Int(value) => serde_json::Value::from(*value).decode_timestamp(default),
            CellValue::Float(value) => timestamp::numeric_to_timestamp(*value)
                .unwrap_or_else(|| default.unwrap_or_else(timestamp::epoch_sentinel)),
            CellValue::Empty | CellValue::Bool(_) => {
                default.unwrap_or_else(timestamp::epoch_sentinel)
            }
        }
    }
}

/// Returns true when `text` is a syntactically valid rider identifier.
pub fn is_rider_id(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// The canonical, fully-typed record for one rider.
///
/// Values are stored in [`RIDER_FIELDS`] order. Instances are only produced
/// by normalization, which guarantees a non-empty identifier and name.
#[derive(Debug, Clone, PartialEq)]
pub struct RiderEntity {
    values: Vec<FieldValue>,
}

impl RiderEntity {
    pub(crate) fn from_values(values: Vec<FieldValue>) -> Self {
        debug_assert_eq!(values.len(), RIDER_FIELDS.len());
        Self { values }
    }

    pub fn id(&self) -> &str {
        self.values[ID_FIELD].as_text().unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.values[NAME_FIELD].as_text().unwrap_or_default()
    }

    /// Returns the value of the field with the given canonical name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        field_index(name).map(|index| &self.values[index])
    }

    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_text).unwrap_or_default()
    }

    pub fn float(&self, name: &str) -> f64 {
        self.get(name).and_then(FieldValue::as_float).unwrap_or_default()
    }

    pub fn int(&self, name: &str) -> i64 {
        self.get(name).and_then(FieldValue::as_int).unwrap_or_default()
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_timestamp)
    }

    /// Iterates over every field together with its table entry.
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &FieldValue)> {
        RIDER_FIELDS.iter().zip(self.values.iter())
    }

    /// Cell values in destination column order.
    pub fn to_row(&self) -> Vec<CellValue> {
        column_order()
            .map(|index| CellValue::from(&self.values[index]))
            .collect()
    }

    /// Lower-case initials of the display name, e.g. `"jd"` for
    /// `"Jane Doe"`.
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Racing-app zFTP divided by weight, two decimals, or `"?"` when the
    /// weight is zero.
    pub fn zftp_wkg(&self) -> String {
        let weight = self.float("weightKg");
        if weight == 0.0 {
            return "?".to_string();
        }
        let ratio = self.float("zwiftRacingAppZpFtpWatts") / weight;
        if ratio.is_finite() {
            format!("{ratio:.2}")
        } else {
            "?".to_string()
        }
    }

    /// Compact category summary: `"B (3.52 - 512)"`, or `"B/C (...)"` for
    /// riders whose gender is `f`.
    pub fn category_summary(&self) -> String {
        let category = if self.text("gender").eq_ignore_ascii_case("f") {
            format!("{}/{}", self.text("zwiftCatOpen"), self.text("zwiftCatFemale"))
        } else {
            self.text("zwiftCatOpen").to_string()
        };
        format!(
            "{category} ({} - {})",
            self.zftp_wkg(),
            blank_if_zero(self.int("zwiftZrsScore"))
        )
    }

    /// Racing-app summary: `"5 (1450 - Ruby)"`. Zero counts print blank.
    pub fn racing_summary(&self) -> String {
        format!(
            "{} ({} - {})",
            blank_if_zero(self.int("zwiftRacingAppCatNum")),
            blank_if_zero(self.int("zwiftRacingAppVeloRating")),
            self.text("zwiftRacingAppCatName")
        )
    }
}

/// Unset counts are stored as zero and shown as nothing.
fn blank_if_zero(value: i64) -> String {
    if value == 0 {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_with(overrides: &[(&str, FieldValue)]) -> RiderEntity {
        let mut values: Vec<FieldValue> = RIDER_FIELDS
            .iter()
            .map(|spec| spec.default.to_value())
            .collect();
        values[ID_FIELD] = FieldValue::Text("42".into());
        values[NAME_FIELD] = FieldValue::Text("Jane  van Doe".into());
        for (name, value) in overrides {
            let index = field_index(name).expect("known field");
            values[index] = value.clone();
        }
        RiderEntity::from_values(values)
    }

    #[test]
    fn rider_keys_from_cells() {
        assert_eq!(CellValue::Text(" 123 ".into()).as_rider_key(), Some("123".into()));
        assert_eq!(CellValue::Float(456.0).as_rider_key(), Some("456".into()));
        assert_eq!(CellValue::Int(7).as_rider_key(), Some("7".into()));
        assert_eq!(CellValue::Float(4.5).as_rider_key(), None);
        assert_eq!(CellValue::Text("x".into()).as_rider_key(), None);
        assert_eq!(CellValue::Int(-1).as_rider_key(), None);
        assert_eq!(CellValue::Empty.as_rider_key(), None);
    }

    #[test]
    fn timestamps_are_persisted_as_iso_strings() {
        let instant = DateTime::parse_from_rfc3339("2024-05-01T06:00:00Z")
            .expect("valid literal")
            .with_timezone(&Utc);
        assert_eq!(
            CellValue::Timestamp(instant).into_persisted(),
            CellValue::Text("2024-05-01T06:00:00.000Z".into())
        );
        assert_eq!(CellValue::Int(3).into_persisted(), CellValue::Int(3));
    }

    #[test]
    fn cells_decode_as_timestamps() {
        let expected = DateTime::parse_from_rfc3339("2023-11-14T22:13:20Z")
            .expect("valid literal")
            .with_timezone(&Utc);
        let fallback = DateTime::parse_from_rfc3339("2001-01-01T00:00:00Z")
            .expect("valid literal")
            .with_timezone(&Utc);

        let iso = CellValue::Text("2023-11-14T22:13:20.000Z".into());
        assert_eq!(timestamp::decode(&iso, None), expected);
        assert_eq!(timestamp::decode(&CellValue::Int(1_700_000_000), None), expected);
        assert_eq!(
            timestamp::decode(&CellValue::Float(1_700_000_000_000.0), None),
            expected
        );
        assert_eq!(timestamp::decode(&CellValue::Timestamp(expected), None), expected);
        assert_eq!(timestamp::decode(&CellValue::Empty, Some(fallback)), fallback);
        assert_eq!(
            timestamp::decode(&CellValue::Bool(true), None),
            timestamp::epoch_sentinel()
        );
    }

    #[test]
    fn display_helpers() {
        let rider = entity_with(&[
            ("gender", FieldValue::Text("F".into())),
            ("weightKg", FieldValue::Float(60.0)),
            ("zwiftRacingAppZpFtpWatts", FieldValue::Float(213.0)),
            ("zwiftCatOpen", FieldValue::Text("B".into())),
            ("zwiftCatFemale", FieldValue::Text("A".into())),
            ("zwiftZrsScore", FieldValue::Int(512)),
            ("zwiftRacingAppCatNum", FieldValue::Int(5)),
            ("zwiftRacingAppVeloRating", FieldValue::Int(1450)),
            ("zwiftRacingAppCatName", FieldValue::Text("Ruby".into())),
        ]);
        assert_eq!(rider.initials(), "jvd");
        assert_eq!(rider.zftp_wkg(), "3.55");
        assert_eq!(rider.category_summary(), "B/A (3.55 - 512)");
        assert_eq!(rider.racing_summary(), "5 (1450 - Ruby)");

        let weightless = entity_with(&[]);
        assert_eq!(weightless.zftp_wkg(), "?");
        assert_eq!(weightless.category_summary(), " (? - )");
        assert_eq!(weightless.racing_summary(), " ( - )");
    }

    #[test]
    fn rows_start_with_the_identifier() {
        let rider = entity_with(&[]);
        let row = rider.to_row();
        assert_eq!(row.len(), RIDER_FIELDS.len());
        assert_eq!(row[0], CellValue::Text("42".into()));
        assert_eq!(row[1], CellValue::Text("Jane  van Doe".into()));
    }
}
