//! Turns caller-supplied payload bytes into the internal JSON representation.
//!
//! Payloads are decoded with key order preserved and numbers kept in their
//! original decimal form, so re-encoding a payload never turns `12` into
//! `12.0` or drops digits from a long decimal.

use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::MessageError;

/// A JSON object payload (`record`, `schema` or `value`).
pub type JsonObject = Map<String, Value>;

/// Object key serde_json uses internally to carry exact number text.
///
/// A payload containing it would decode as a number instead of an object,
/// so it is rejected outright.
pub const RESERVED_NUMBER_KEY: &str = "$serde_json::private::Number";

pub(crate) fn contains_reserved_key(raw: &[u8]) -> bool {
    let needle = RESERVED_NUMBER_KEY.as_bytes();
    raw.windows(needle.len()).any(|window| window == needle)
}

pub(crate) fn reserved_key_message() -> String {
    format!("object key `{RESERVED_NUMBER_KEY}` is reserved and cannot be carried")
}

/// Decodes `raw` as a JSON object for the wire field named `field`.
///
/// Any other top-level shape (array, scalar, `null`) is rejected, as is any
/// payload mentioning [`RESERVED_NUMBER_KEY`].
pub fn decode_object(field: &'static str, raw: &[u8]) -> Result<JsonObject, MessageError> {
    if contains_reserved_key(raw) {
        return Err(MessageError::MalformedPayload {
            field,
            message: reserved_key_message(),
        });
    }
    let value: Value =
        serde_json::from_slice(raw).map_err(|err| MessageError::MalformedPayload {
            field,
            message: err.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MessageError::MalformedPayload {
            field,
            message: format!("expected a JSON object, found {}", json_type_name(&other)),
        }),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Unset and epoch timestamps both count as absent.
pub(crate) fn is_zero_timestamp(ts: Option<&OffsetDateTime>) -> bool {
    match ts {
        None => true,
        Some(ts) => *ts == OffsetDateTime::UNIX_EPOCH,
    }
}

pub(crate) fn format_timestamp(ts: &OffsetDateTime) -> Result<String, MessageError> {
    ts.format(&Rfc3339).map_err(|err| {
        MessageError::InvalidMessage(format!(
            "`{}` cannot be encoded as RFC 3339: {err}",
            crate::KEY_TIME_EXTRACTED
        ))
    })
}

/// Best-effort timestamp recovery; anything that is not an RFC 3339 string is unset.
pub(crate) fn parse_timestamp(value: Option<&Value>) -> Option<OffsetDateTime> {
    let raw = value?.as_str()?;
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .filter(|ts| !is_zero_timestamp(Some(ts)))
}
