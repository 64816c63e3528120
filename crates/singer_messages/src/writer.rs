use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::MessageError;
use crate::message::{
    ActivateVersionMessage, Message, RecordMessage, SchemaMessage, StateMessage,
};

/// Optional fields for record writes. Zero values are left off the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordExtras {
    pub version: String,
    pub time_extracted: Option<OffsetDateTime>,
}

/// Writes messages to a sink, one JSON line per call.
///
/// The writer holds no state besides the sink: every call renders the full
/// line first and hands it to the sink in a single `write_all`, so a failed
/// render never leaves partial output behind.
#[derive(Debug)]
pub struct MessageWriter<W: Write> {
    sink: W,
    flush_each_line: bool,
}

impl MessageWriter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> MessageWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            flush_each_line: true,
        }
    }

    /// Controls whether the sink is flushed after every line (default: `true`).
    pub fn flush_each_line(mut self, enable: bool) -> Self {
        self.flush_each_line = enable;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn write_message(&mut self, message: &Message) -> Result<(), MessageError> {
        let line = message.to_line()?;
        if let Err(err) = self.emit(&line) {
            warn!(
                message_type = %message.message_type(),
                error = %err,
                "sink rejected message line"
            );
            return Err(MessageError::sink(err));
        }
        debug!(
            message_type = %message.message_type(),
            stream = message.stream().unwrap_or(""),
            bytes = line.len(),
            "wrote message"
        );
        Ok(())
    }

    /// Flushes the sink; needed only when `flush_each_line` is off.
    pub fn flush(&mut self) -> Result<(), MessageError> {
        self.sink.flush().map_err(|err| {
            warn!(error = %err, "sink rejected flush");
            MessageError::sink(err)
        })
    }

    fn emit(&mut self, line: &[u8]) -> io::Result<()> {
        self.sink.write_all(line)?;
        if self.flush_each_line {
            self.sink.flush()?;
        }
        Ok(())
    }

    pub fn write_record(&mut self, stream: &str, raw_record: &[u8]) -> Result<(), MessageError> {
        self.write_record_with(stream, raw_record, &RecordExtras::default())
    }

    pub fn write_record_with(
        &mut self,
        stream: &str,
        raw_record: &[u8],
        extras: &RecordExtras,
    ) -> Result<(), MessageError> {
        let msg = RecordMessage::new(stream, raw_record)?
            .with_version(extras.version.as_str())
            .with_time_extracted(extras.time_extracted);
        self.write_message(&Message::Record(msg))
    }

    /// Writes each payload as its own RECORD line.
    ///
    /// Stops at the first failure; lines already written stay on the sink.
    pub fn write_records<I, P>(&mut self, stream: &str, raw_records: I) -> Result<(), MessageError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.write_records_with(stream, raw_records, &RecordExtras::default())
    }

    pub fn write_records_with<I, P>(
        &mut self,
        stream: &str,
        raw_records: I,
        extras: &RecordExtras,
    ) -> Result<(), MessageError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        for raw in raw_records {
            self.write_record_with(stream, raw.as_ref(), extras)?;
        }
        Ok(())
    }

    pub fn write_schema<K, S>(
        &mut self,
        stream: &str,
        raw_schema: &[u8],
        key_properties: K,
    ) -> Result<(), MessageError>
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_schema_with(stream, raw_schema, key_properties, Vec::<String>::new())
    }

    pub fn write_schema_with<K, B, S, T>(
        &mut self,
        stream: &str,
        raw_schema: &[u8],
        key_properties: K,
        bookmark_properties: B,
    ) -> Result<(), MessageError>
    where
        K: IntoIterator<Item = S>,
        S: Into<String>,
        B: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let msg = SchemaMessage::new(stream, raw_schema, key_properties)?
            .with_bookmark_properties(bookmark_properties);
        self.write_message(&Message::Schema(msg))
    }

    pub fn write_state(&mut self, raw_value: &[u8]) -> Result<(), MessageError> {
        let msg = StateMessage::new(raw_value)?;
        self.write_message(&Message::State(msg))
    }

    pub fn write_activate_version(
        &mut self,
        stream: &str,
        version: &str,
    ) -> Result<(), MessageError> {
        let msg = ActivateVersionMessage::new(stream, version);
        self.write_message(&Message::ActivateVersion(msg))
    }
}

/// Cloneable handle for producers sharing one sink.
///
/// Each message write takes the lock once, so lines from different
/// producers never interleave.
#[derive(Debug)]
pub struct SharedMessageWriter<W: Write> {
    inner: Arc<Mutex<MessageWriter<W>>>,
}

impl<W: Write> Clone for SharedMessageWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> SharedMessageWriter<W> {
    pub fn new(writer: MessageWriter<W>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Runs `f` with exclusive access to the writer.
    ///
    /// Multi-message operations such as `write_records` hold the lock for the
    /// whole batch.
    pub fn with_writer<T>(&self, f: impl FnOnce(&mut MessageWriter<W>) -> T) -> T {
        // Poisoning is ignored: the writer itself holds no state, and each
        // message is fully rendered before any of its bytes reach the sink.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn write_message(&self, message: &Message) -> Result<(), MessageError> {
        self.with_writer(|writer| writer.write_message(message))
    }
}
