use serde_json::{Map, Value};

use crate::zsun::riders::error::{Result, RiderError, ValidationCode};
use crate::zsun::riders::normalize::json_kind;

/// The two accepted top-level payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Identifier → raw record.
    Dictionary(Map<String, Value>),
    /// A list of raw records, each carrying its own identifier.
    Records(Vec<Value>),
}

impl RawPayload {
    pub fn len(&self) -> usize {
        match self {
            RawPayload::Dictionary(entries) => entries.len(),
            RawPayload::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses payload text into one of the accepted shapes.
pub fn parse_payload(text: &str) -> Result<RawPayload> {
    let value: Value = serde_json::from_str(text.trim()).map_err(|err| {
        RiderError::validation(
            ValidationCode::MalformedJson,
            format!("payload is not valid JSON: {err}"),
        )
    })?;
    payload_from_value(value)
}

/// Classifies an already parsed JSON document.
pub fn payload_from_value(value: Value) -> Result<RawPayload> {
    match value {
        Value::Object(entries) => Ok(RawPayload::Dictionary(entries)),
        Value::Array(records) => Ok(RawPayload::Records(records)),
        other => Err(RiderError::validation(
            ValidationCode::UnsupportedShape,
            format!(
                "payload must be a rider dictionary or an array of riders, found {}",
                json_kind(&other)
            ),
        )),
    }
}
