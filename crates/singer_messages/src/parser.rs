use serde_json::Value;

use crate::canonical::{self, json_type_name, JsonObject};
use crate::error::{MessageError, MessageLineError};
use crate::message::{
    ActivateVersionMessage, Message, MessageType, RecordMessage, SchemaMessage, StateMessage,
};
use crate::{
    KEY_BOOKMARK_PROPERTIES, KEY_KEY_PROPERTIES, KEY_RECORD, KEY_SCHEMA, KEY_STREAM,
    KEY_TIME_EXTRACTED, KEY_TYPE, KEY_VALUE, KEY_VERSION,
};

/// Parses one line of JSON text into a [`Message`].
pub fn parse_message(line: &str) -> Result<Message, MessageError> {
    parse_message_slice(line.as_bytes())
}

/// Parses one line of JSON bytes into a [`Message`].
pub fn parse_message_slice(line: &[u8]) -> Result<Message, MessageError> {
    if canonical::contains_reserved_key(line) {
        return Err(MessageError::InvalidMessage(canonical::reserved_key_message()));
    }
    let value: Value = serde_json::from_slice(line)
        .map_err(|err| MessageError::InvalidMessage(format!("line is not valid JSON: {err}")))?;
    parse_value(&value)
}

fn parse_value(value: &Value) -> Result<Message, MessageError> {
    let Value::Object(obj) = value else {
        return Err(MessageError::InvalidMessage(format!(
            "expected a JSON object, found {}",
            json_type_name(value)
        )));
    };

    let tag = required(obj, KEY_TYPE)?;
    let Some(tag) = tag.as_str() else {
        return Err(MessageError::InvalidMessage(format!(
            "`{KEY_TYPE}` must be a string, found {}",
            json_type_name(tag)
        )));
    };
    let Some(message_type) = MessageType::from_wire(tag) else {
        return Err(MessageError::UnknownMessageType(tag.to_string()));
    };

    let message = match message_type {
        MessageType::Record => {
            let stream = required_string(obj, KEY_STREAM)?;
            let record = required_object(obj, KEY_RECORD)?;
            Message::Record(RecordMessage {
                stream,
                record,
                version: optional_string(obj, KEY_VERSION),
                time_extracted: canonical::parse_timestamp(obj.get(KEY_TIME_EXTRACTED)),
            })
        }
        MessageType::Schema => {
            let stream = required_string(obj, KEY_STREAM)?;
            let schema = required_object(obj, KEY_SCHEMA)?;
            Message::Schema(SchemaMessage {
                stream,
                schema,
                key_properties: optional_strings(obj, KEY_KEY_PROPERTIES),
                bookmark_properties: optional_strings(obj, KEY_BOOKMARK_PROPERTIES),
            })
        }
        MessageType::State => Message::State(StateMessage {
            value: required_object(obj, KEY_VALUE)?,
        }),
        MessageType::ActivateVersion => {
            let stream = required_string(obj, KEY_STREAM)?;
            let version = required_string(obj, KEY_VERSION)?;
            Message::ActivateVersion(ActivateVersionMessage { stream, version })
        }
    };
    Ok(message)
}

fn required<'a>(obj: &'a JsonObject, key: &'static str) -> Result<&'a Value, MessageError> {
    obj.get(key).ok_or(MessageError::MissingField(key))
}

fn required_string(obj: &JsonObject, key: &'static str) -> Result<String, MessageError> {
    match required(obj, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(MessageError::InvalidMessage(format!(
            "`{key}` must be a string, found {}",
            json_type_name(other)
        ))),
    }
}

fn required_object(obj: &JsonObject, key: &'static str) -> Result<JsonObject, MessageError> {
    match required(obj, key)? {
        Value::Object(map) => Ok(map.clone()),
        other => Err(MessageError::InvalidMessage(format!(
            "`{key}` must be an object, found {}",
            json_type_name(other)
        ))),
    }
}

fn optional_string(obj: &JsonObject, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

// A list containing any non-string entry is treated as absent.
fn optional_strings(obj: &JsonObject, key: &str) -> Vec<String> {
    let Some(items) = obj.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

/// Line-oriented parser for a message stream.
///
/// Stateless: every line is interpreted on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageParser;

impl MessageParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses a single logical line.
    ///
    /// - Returns `Ok(None)` for empty / whitespace-only lines.
    /// - A trailing `\r` is ignored.
    /// - Otherwise returns the parsed message or the typed failure.
    pub fn parse_line(&self, line: &str) -> Result<Option<Message>, MessageError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.chars().all(|ch| ch.is_whitespace()) {
            return Ok(None);
        }
        parse_message(line).map(Some)
    }

    /// Parses an already-decoded JSON value with the same rules as [`parse_message`].
    pub fn parse_json(&self, value: &Value) -> Result<Message, MessageError> {
        parse_value(value)
    }
}

#[derive(Debug, Clone)]
pub struct MessageLine {
    pub line_number: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum MessageLineOutcome {
    Ok {
        line: MessageLine,
        message: Message,
    },
    Err {
        line: MessageLine,
        error: MessageLineError,
    },
}

/// Parses every non-blank line of `text`, keeping going past failures.
pub fn parse_message_lines(text: &str) -> Vec<MessageLineOutcome> {
    let parser = MessageParser::new();
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let raw = raw.trim_end_matches('\r');
        let line = MessageLine {
            line_number,
            raw: raw.to_string(),
        };
        match parser.parse_line(&line.raw) {
            Ok(Some(message)) => out.push(MessageLineOutcome::Ok { line, message }),
            Ok(None) => {}
            Err(err) => out.push(MessageLineOutcome::Err {
                line,
                error: MessageLineError {
                    line_number,
                    kind: err.kind(),
                    message: err.to_string(),
                },
            }),
        }
    }
    out
}
