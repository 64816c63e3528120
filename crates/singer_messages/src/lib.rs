#![forbid(unsafe_code)]
//! Line-delimited JSON messages for streaming extracted data between processes.
//!
//! A producer emits `RECORD`, `SCHEMA`, `STATE` and `ACTIVATE_VERSION`
//! messages, one JSON object per line, onto a sink it is handed at startup.
//! A consumer parses each line on its own back into a typed [`Message`].
//!
//! ```
//! use singer_messages::{parse_message, Message, MessageWriter};
//!
//! let mut writer = MessageWriter::new(Vec::new());
//! writer.write_record("users", br#"{"id":1,"name":"Chris"}"#).unwrap();
//!
//! let out = writer.into_inner();
//! let line = std::str::from_utf8(&out).unwrap();
//! assert_eq!(
//!     line,
//!     "{\"type\":\"RECORD\",\"stream\":\"users\",\"record\":{\"id\":1,\"name\":\"Chris\"}}\n"
//! );
//! assert!(matches!(parse_message(line.trim_end()), Ok(Message::Record(_))));
//! ```

mod canonical;
mod config;
mod error;
mod message;
mod parser;
mod writer;

#[cfg(any(feature = "tokio", test))]
mod async_writer;

pub use canonical::{decode_object, JsonObject, RESERVED_NUMBER_KEY};
pub use config::{SinkConfig, SinkTarget};
pub use error::{ErrorKind, MessageError, MessageLineError, SinkConfigError};
pub use message::{
    ActivateVersionMessage, Message, MessageType, RecordMessage, SchemaMessage, StateMessage,
};
pub use parser::{
    parse_message, parse_message_lines, parse_message_slice, MessageLine, MessageLineOutcome,
    MessageParser,
};
pub use writer::{MessageWriter, RecordExtras, SharedMessageWriter};

#[cfg(any(feature = "tokio", test))]
pub use async_writer::AsyncMessageWriter;

// Wire field names.
pub const KEY_TYPE: &str = "type";
pub const KEY_STREAM: &str = "stream";
pub const KEY_RECORD: &str = "record";
pub const KEY_SCHEMA: &str = "schema";
pub const KEY_VERSION: &str = "version";
pub const KEY_TIME_EXTRACTED: &str = "time_extracted";
pub const KEY_KEY_PROPERTIES: &str = "key_properties";
pub const KEY_BOOKMARK_PROPERTIES: &str = "bookmark_properties";
pub const KEY_VALUE: &str = "value";
