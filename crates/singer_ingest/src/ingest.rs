use std::io::BufRead;

use singer_messages::{ErrorKind, MessageError, MessageParser};
use tracing::{debug, warn};

use crate::config::{ErrorDetailCapture, IngestConfig};
use crate::error::{ErrorDetail, LineRecord, LineRecordError};
use crate::reader::{BoundedLine, BoundedLineReader};

/// Turns a line-delimited message stream into one [`LineRecord`] per non-blank line.
///
/// A bad line never ends ingestion; only a read error on the underlying
/// stream does.
pub struct MessageIngestor<R: BufRead> {
    reader: BoundedLineReader<R>,
    parser: MessageParser,
    config: IngestConfig,
}

impl<R: BufRead> MessageIngestor<R> {
    pub fn new(reader: R, config: IngestConfig) -> Self {
        Self {
            reader: BoundedLineReader::new(reader, config.limits.max_line_bytes),
            parser: MessageParser::new(),
            config,
        }
    }

    fn record_error(line_number: usize, err: LineRecordError) -> LineRecord {
        LineRecord {
            line_number,
            raw_line: None,
            outcome: Err(err),
        }
    }

    fn message_error_record(
        &mut self,
        line_number: usize,
        raw_line: Option<String>,
        err: MessageError,
    ) -> LineRecord {
        let kind = err.kind();
        debug!(line_number, ?kind, "message line failed to parse");
        if self.config.error_detail_capture == ErrorDetailCapture::FullDetails {
            if let Some(sink) = self.config.error_sink.as_mut() {
                sink.on_error(ErrorDetail {
                    line_number,
                    kind,
                    details: err.to_string(),
                });
            }
        }
        LineRecord {
            line_number,
            raw_line,
            outcome: Err(LineRecordError::Message {
                kind,
                summary: redacted_summary(&err),
            }),
        }
    }
}

/// Summary that never echoes payload content.
fn redacted_summary(err: &MessageError) -> String {
    match err {
        MessageError::MissingField(field) => format!("missing required key `{field}`"),
        MessageError::UnknownMessageType(_) => "unrecognised message type".to_string(),
        _ => match err.kind() {
            ErrorKind::MalformedPayload => "malformed payload".to_string(),
            ErrorKind::SinkWriteFailure => "sink write failure".to_string(),
            _ => "line is not a valid message".to_string(),
        },
    }
}

impl<R: BufRead> Iterator for MessageIngestor<R> {
    type Item = LineRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.next()? {
                BoundedLine::IoError { line_number } => {
                    warn!(line_number, "read error on message stream");
                    return Some(Self::record_error(line_number, LineRecordError::Io));
                }
                BoundedLine::LineTooLong {
                    line_number,
                    observed_bytes,
                    max_line_bytes,
                } => {
                    warn!(
                        line_number,
                        observed_bytes, max_line_bytes, "discarded oversized message line"
                    );
                    return Some(Self::record_error(
                        line_number,
                        LineRecordError::LineTooLong {
                            observed_bytes,
                            max_line_bytes,
                        },
                    ));
                }
                BoundedLine::Line { line_number, bytes } => {
                    let Ok(raw_line) = String::from_utf8(bytes) else {
                        warn!(line_number, "message line is not valid UTF-8");
                        return Some(Self::record_error(
                            line_number,
                            LineRecordError::InvalidUtf8,
                        ));
                    };

                    let parsed = self.parser.parse_line(&raw_line);
                    let captured = self.config.capture_raw_line.then(|| {
                        raw_line
                            .strip_suffix('\r')
                            .unwrap_or(&raw_line)
                            .to_string()
                    });
                    match parsed {
                        Ok(None) => continue,
                        Ok(Some(message)) => {
                            return Some(LineRecord {
                                line_number,
                                raw_line: captured,
                                outcome: Ok(message),
                            });
                        }
                        Err(err) => {
                            return Some(self.message_error_record(line_number, captured, err));
                        }
                    }
                }
            }
        }
    }
}
