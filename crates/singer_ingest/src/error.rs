use singer_messages::{ErrorKind, Message};
use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum LineRecordError {
    #[error("I/O error while reading message stream")]
    Io,
    #[error("invalid UTF-8 in message stream")]
    InvalidUtf8,
    #[error("line too long (observed_bytes={observed_bytes}, max_line_bytes={max_line_bytes})")]
    LineTooLong {
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    #[error("message parse failure ({kind:?}): {summary}")]
    Message { kind: ErrorKind, summary: String },
}

#[derive(Debug, Clone)]
pub struct LineRecord {
    /// 1-based line number in the underlying stream.
    pub line_number: usize,
    pub raw_line: Option<String>,
    pub outcome: Result<Message, LineRecordError>,
}

#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub line_number: usize,
    pub kind: ErrorKind,
    pub details: String,
}

/// Receives full error text when [`crate::ErrorDetailCapture::FullDetails`] is on.
pub trait ErrorDetailSink: Send + 'static {
    fn on_error(&mut self, detail: ErrorDetail);
}

impl<F> ErrorDetailSink for F
where
    F: FnMut(ErrorDetail) + Send + 'static,
{
    fn on_error(&mut self, detail: ErrorDetail) {
        self(detail)
    }
}
