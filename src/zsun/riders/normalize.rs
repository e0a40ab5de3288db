use serde_json::{Map, Number, Value};

use crate::zsun::riders::coerce;
use crate::zsun::riders::error::{Result, RiderError, ValidationCode};
use crate::zsun::riders::model::{
    FieldDefault, FieldKind, FieldSpec, FieldValue, ID_FIELD, NAME_FIELD, RIDER_FIELDS, RiderEntity,
};
use crate::zsun::riders::timestamp;

/// Returns the value stored under the first alias that is present and not
/// `null` or an empty string, or `default` when none qualifies.
///
/// Alias order matters: the first alias is the preferred key.
pub fn resolve<'a>(record: &'a Map<String, Value>, aliases: &[&str], default: &'a Value) -> &'a Value {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| !is_blank(value))
        .unwrap_or(default)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Coerces a resolved raw value according to the field's declared type.
/// Never fails; unusable input yields the field's default.
pub fn coerce_field(spec: &FieldSpec, raw: &Value) -> FieldValue {
    match (spec.kind, spec.default) {
        (FieldKind::Identifier, FieldDefault::Text(default)) => {
            FieldValue::Text(to_identifier(raw, default))
        }
        (
            FieldKind::DisplayName | FieldKind::Text | FieldKind::Category,
            FieldDefault::Text(default),
        ) => FieldValue::Text(coerce::to_text(raw, default)),
        (FieldKind::Float, FieldDefault::Float(default)) => {
            FieldValue::Float(coerce::to_float(raw, default))
        }
        (FieldKind::Int, FieldDefault::Int(default)) => FieldValue::Int(coerce::to_int(raw, default)),
        (FieldKind::Timestamp, FieldDefault::Epoch) => {
            FieldValue::Timestamp(timestamp::decode(raw, None))
        }
        // A table entry whose default does not match its kind still
        // produces a value of the declared kind.
        (kind, _) => coerce_field(
            &FieldSpec {
                default: default_for(kind),
                ..*spec
            },
            raw,
        ),
    }
}

fn default_for(kind: FieldKind) -> FieldDefault {
    match kind {
        FieldKind::Identifier | FieldKind::DisplayName | FieldKind::Text | FieldKind::Category => {
            FieldDefault::Text("")
        }
        FieldKind::Float => FieldDefault::Float(0.0),
        FieldKind::Int => FieldDefault::Int(0),
        FieldKind::Timestamp => FieldDefault::Epoch,
    }
}

/// Identifiers arrive as strings or as integral numbers.
fn to_identifier(raw: &Value, default: &str) -> String {
    match raw {
        Value::Number(number) => {
            number_to_identifier(number).unwrap_or_else(|| default.to_string())
        }
        other => coerce::to_text(other, default),
    }
}

/// Renders an integral JSON number as decimal digits, so `123` and `123.0`
/// name the same rider.
pub(crate) fn number_to_identifier(number: &Number) -> Option<String> {
    if let Some(id) = number.as_u64() {
        Some(id.to_string())
    } else if let Some(id) = number.as_i64() {
        Some(id.to_string())
    } else {
        number
            .as_f64()
            .filter(|id| id.is_finite() && id.fract() == 0.0)
            .map(|id| format!("{id:.0}"))
    }
}

/// Normalizes one raw record into a [`RiderEntity`].
///
/// Returns `Ok(None)` when the identifier or display name is empty after
/// resolution; every other field silently falls back to its default. Fails
/// only when `raw` is not a JSON object.
pub fn normalize(raw: &Value) -> Result<Option<RiderEntity>> {
    match raw {
        Value::Object(record) => Ok(normalize_record(record)),
        other => Err(RiderError::validation(
            ValidationCode::NonObjectRecord,
            format!("expected rider record object, found {}", json_kind(other)),
        )),
    }
}

/// Normalizes an already-validated record object.
pub fn normalize_record(record: &Map<String, Value>) -> Option<RiderEntity> {
    let missing = Value::Null;
    let values: Vec<FieldValue> = RIDER_FIELDS
        .iter()
        .map(|spec| coerce_field(spec, resolve(record, spec.aliases, &missing)))
        .collect();

    let has_identity = [ID_FIELD, NAME_FIELD]
        .iter()
        .all(|index| values[*index].as_text().is_some_and(|text| !text.is_empty()));
    has_identity.then(|| RiderEntity::from_values(values))
}

/// Encodes an entity back into a raw record keyed by preferred aliases.
pub fn serialize_entity(entity: &RiderEntity) -> Map<String, Value> {
    entity
        .fields()
        .map(|(spec, value)| (spec.preferred_alias().to_string(), value.to_json()))
        .collect()
}

/// Encodes entities as a dictionary payload keyed by identifier.
pub fn serialize_entities<'a>(entities: impl IntoIterator<Item = &'a RiderEntity>) -> Value {
    let dictionary: Map<String, Value> = entities
        .into_iter()
        .map(|entity| (entity.id().to_string(), Value::Object(serialize_entity(entity))))
        .collect();
    Value::Object(dictionary)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
