use std::fmt;

use serde_json::Value;
use time::OffsetDateTime;

use crate::canonical::{self, decode_object, JsonObject};
use crate::error::MessageError;
use crate::{
    KEY_BOOKMARK_PROPERTIES, KEY_KEY_PROPERTIES, KEY_RECORD, KEY_SCHEMA, KEY_STREAM,
    KEY_TIME_EXTRACTED, KEY_TYPE, KEY_VALUE, KEY_VERSION,
};

/// The `type` discriminator carried by every message on the wire.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MessageType {
    Record,
    Schema,
    State,
    ActivateVersion,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Record => "RECORD",
            MessageType::Schema => "SCHEMA",
            MessageType::State => "STATE",
            MessageType::ActivateVersion => "ACTIVATE_VERSION",
        }
    }

    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "RECORD" => Some(MessageType::Record),
            "SCHEMA" => Some(MessageType::Schema),
            "STATE" => Some(MessageType::State),
            "ACTIVATE_VERSION" => Some(MessageType::ActivateVersion),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row belonging to a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    pub stream: String,
    pub record: JsonObject,
    /// Empty means unset.
    pub version: String,
    /// `None` (or the Unix epoch) means unset.
    pub time_extracted: Option<OffsetDateTime>,
}

impl RecordMessage {
    /// Builds a record from raw JSON object bytes.
    pub fn new(stream: impl Into<String>, raw_record: &[u8]) -> Result<Self, MessageError> {
        Ok(Self {
            stream: stream.into(),
            record: decode_object(KEY_RECORD, raw_record)?,
            version: String::new(),
            time_extracted: None,
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_time_extracted(mut self, time_extracted: Option<OffsetDateTime>) -> Self {
        self.time_extracted = time_extracted;
        self
    }
}

/// Structural description of a stream's records.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMessage {
    pub stream: String,
    pub schema: JsonObject,
    pub key_properties: Vec<String>,
    /// Empty means unset.
    pub bookmark_properties: Vec<String>,
}

impl SchemaMessage {
    pub fn new<K, S>(
        stream: impl Into<String>,
        raw_schema: &[u8],
        key_properties: K,
    ) -> Result<Self, MessageError>
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            stream: stream.into(),
            schema: decode_object(KEY_SCHEMA, raw_schema)?,
            key_properties: key_properties.into_iter().map(Into::into).collect(),
            bookmark_properties: Vec::new(),
        })
    }

    pub fn with_bookmark_properties<B, S>(mut self, bookmark_properties: B) -> Self
    where
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bookmark_properties = bookmark_properties.into_iter().map(Into::into).collect();
        self
    }
}

/// Global checkpoint snapshot; not tied to any stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMessage {
    pub value: JsonObject,
}

impl StateMessage {
    pub fn new(raw_value: &[u8]) -> Result<Self, MessageError> {
        Ok(Self {
            value: decode_object(KEY_VALUE, raw_value)?,
        })
    }
}

/// Tells the consumer that `stream` cuts over to `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateVersionMessage {
    pub stream: String,
    pub version: String,
}

impl ActivateVersionMessage {
    pub fn new(stream: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            version: version.into(),
        }
    }
}

/// Any message that can appear on the wire.
///
/// The variant fixes the `type` tag; callers never set it directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Record(RecordMessage),
    Schema(SchemaMessage),
    State(StateMessage),
    ActivateVersion(ActivateVersionMessage),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Record(_) => MessageType::Record,
            Message::Schema(_) => MessageType::Schema,
            Message::State(_) => MessageType::State,
            Message::ActivateVersion(_) => MessageType::ActivateVersion,
        }
    }

    /// The stream this message belongs to, if any. `STATE` is global.
    pub fn stream(&self) -> Option<&str> {
        match self {
            Message::Record(msg) => Some(&msg.stream),
            Message::Schema(msg) => Some(&msg.stream),
            Message::ActivateVersion(msg) => Some(&msg.stream),
            Message::State(_) => None,
        }
    }

    /// Renders the wire-ready field mapping.
    ///
    /// Keys come out as `type`, the required fields, then any optional field
    /// that is not at its zero value.
    pub fn to_wire(&self) -> Result<JsonObject, MessageError> {
        let mut out = JsonObject::new();
        out.insert(
            KEY_TYPE.to_string(),
            Value::from(self.message_type().as_str()),
        );
        match self {
            Message::Record(msg) => {
                out.insert(KEY_STREAM.to_string(), Value::from(msg.stream.as_str()));
                out.insert(KEY_RECORD.to_string(), Value::Object(msg.record.clone()));
                if !msg.version.is_empty() {
                    out.insert(KEY_VERSION.to_string(), Value::from(msg.version.as_str()));
                }
                if let Some(ts) = msg.time_extracted.as_ref() {
                    if !canonical::is_zero_timestamp(Some(ts)) {
                        out.insert(
                            KEY_TIME_EXTRACTED.to_string(),
                            Value::from(canonical::format_timestamp(ts)?),
                        );
                    }
                }
            }
            Message::Schema(msg) => {
                out.insert(KEY_STREAM.to_string(), Value::from(msg.stream.as_str()));
                out.insert(KEY_SCHEMA.to_string(), Value::Object(msg.schema.clone()));
                out.insert(
                    KEY_KEY_PROPERTIES.to_string(),
                    string_array(&msg.key_properties),
                );
                if !msg.bookmark_properties.is_empty() {
                    out.insert(
                        KEY_BOOKMARK_PROPERTIES.to_string(),
                        string_array(&msg.bookmark_properties),
                    );
                }
            }
            Message::State(msg) => {
                out.insert(KEY_VALUE.to_string(), Value::Object(msg.value.clone()));
            }
            Message::ActivateVersion(msg) => {
                out.insert(KEY_STREAM.to_string(), Value::from(msg.stream.as_str()));
                out.insert(KEY_VERSION.to_string(), Value::from(msg.version.as_str()));
            }
        }
        Ok(out)
    }

    /// Renders the message as one line of JSON, newline included.
    pub fn to_line(&self) -> Result<Vec<u8>, MessageError> {
        let wire = self.to_wire()?;
        let mut line = serde_json::to_vec(&wire)
            .map_err(|err| MessageError::InvalidMessage(err.to_string()))?;
        line.push(b'\n');
        Ok(line)
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| Value::from(s.as_str())).collect())
}

impl From<RecordMessage> for Message {
    fn from(msg: RecordMessage) -> Self {
        Message::Record(msg)
    }
}

impl From<SchemaMessage> for Message {
    fn from(msg: SchemaMessage) -> Self {
        Message::Schema(msg)
    }
}

impl From<StateMessage> for Message {
    fn from(msg: StateMessage) -> Self {
        Message::State(msg)
    }
}

impl From<ActivateVersionMessage> for Message {
    fn from(msg: ActivateVersionMessage) -> Self {
        Message::ActivateVersion(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn line(msg: impl Into<Message>) -> String {
        String::from_utf8(msg.into().to_line().unwrap()).unwrap()
    }

    #[test]
    fn record_omits_zero_valued_optionals() {
        let msg = RecordMessage::new("users", br#"{"id":12,"name": "foo"}"#).unwrap();
        assert_eq!(
            line(msg),
            "{\"type\":\"RECORD\",\"stream\":\"users\",\"record\":{\"id\":12,\"name\":\"foo\"}}\n"
        );

        let epoch = RecordMessage::new("users", b"{}")
            .unwrap()
            .with_version("")
            .with_time_extracted(Some(OffsetDateTime::UNIX_EPOCH));
        let wire = Message::from(epoch).to_wire().unwrap();
        assert!(!wire.contains_key(KEY_VERSION));
        assert!(!wire.contains_key(KEY_TIME_EXTRACTED));
    }

    #[test]
    fn record_includes_set_optionals_after_required_fields() {
        let msg = RecordMessage::new("users", br#"{"id":1}"#)
            .unwrap()
            .with_version("v2")
            .with_time_extracted(Some(datetime!(2000-01-01 0:00 -5)));
        assert_eq!(
            line(msg),
            concat!(
                r#"{"type":"RECORD","stream":"users","record":{"id":1},"#,
                r#""version":"v2","time_extracted":"2000-01-01T00:00:00-05:00"}"#,
                "\n"
            )
        );
    }

    #[test]
    fn schema_bookmarks_are_optional_and_ordered() {
        let schema = br#"{"type": "object", "properties": {"name": {"type": "string"}}}"#;
        let bare = SchemaMessage::new("users", schema, ["name"]).unwrap();
        let wire = Message::from(bare.clone()).to_wire().unwrap();
        assert!(!wire.contains_key(KEY_BOOKMARK_PROPERTIES));
        assert_eq!(wire[KEY_KEY_PROPERTIES], serde_json::json!(["name"]));

        let with = bare.with_bookmark_properties(["updated_at", "id"]);
        let wire = Message::from(with).to_wire().unwrap();
        assert_eq!(
            wire[KEY_BOOKMARK_PROPERTIES],
            serde_json::json!(["updated_at", "id"])
        );
    }

    #[test]
    fn schema_with_no_keys_still_writes_key_properties() {
        let msg = SchemaMessage::new("users", b"{}", Vec::<String>::new()).unwrap();
        assert_eq!(
            line(msg),
            "{\"type\":\"SCHEMA\",\"stream\":\"users\",\"schema\":{},\"key_properties\":[]}\n"
        );
    }

    #[test]
    fn state_and_activate_version_render() {
        let state = StateMessage::new(br#"{"users":2,"locations":1}"#).unwrap();
        assert_eq!(
            line(state),
            "{\"type\":\"STATE\",\"value\":{\"users\":2,\"locations\":1}}\n"
        );
        assert_eq!(
            line(ActivateVersionMessage::new("users", "1700000000")),
            "{\"type\":\"ACTIVATE_VERSION\",\"stream\":\"users\",\"version\":\"1700000000\"}\n"
        );
    }

    #[test]
    fn invalid_payload_produces_no_message() {
        let err = RecordMessage::new("users", b"[1]").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedPayload);
        let err = StateMessage::new(b"{").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedPayload);
    }

    #[test]
    fn type_tags_round_trip() {
        for ty in [
            MessageType::Record,
            MessageType::Schema,
            MessageType::State,
            MessageType::ActivateVersion,
        ] {
            assert_eq!(MessageType::from_wire(ty.as_str()), Some(ty));
        }
        assert_eq!(MessageType::from_wire("record"), None);
    }
}
