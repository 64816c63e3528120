use thiserror::Error;

/// Coarse classification of a [`MessageError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    MalformedPayload,
    MissingField,
    InvalidMessage,
    UnknownMessageType,
    SinkWriteFailure,
}

/// Errors raised while constructing, writing or parsing messages.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Caller-supplied payload bytes were not valid JSON, or not a JSON object.
    #[error("malformed `{field}` payload: {message}")]
    MalformedPayload {
        field: &'static str,
        message: String,
    },
    #[error("message is missing required key: {0}")]
    MissingField(&'static str),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("unknown message type `{0}`")]
    UnknownMessageType(String),
    #[error("failed writing message to sink: {source}")]
    SinkWrite {
        #[source]
        source: std::io::Error,
    },
}

impl MessageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MessageError::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            MessageError::MissingField(_) => ErrorKind::MissingField,
            MessageError::InvalidMessage(_) => ErrorKind::InvalidMessage,
            MessageError::UnknownMessageType(_) => ErrorKind::UnknownMessageType,
            MessageError::SinkWrite { .. } => ErrorKind::SinkWriteFailure,
        }
    }

    pub(crate) fn sink(source: std::io::Error) -> Self {
        MessageError::SinkWrite { source }
    }
}

/// Errors raised while resolving a [`crate::SinkConfig`] into a writer.
#[derive(Debug, Error)]
pub enum SinkConfigError {
    #[error("failed to parse sink config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("file sink requires a `path`")]
    MissingPath,
    #[error("failed to open sink file `{path}`: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single line that failed to parse inside [`crate::parse_message_lines`].
#[derive(Debug, Error, Clone)]
#[error("message line {line_number}: {message}")]
pub struct MessageLineError {
    pub line_number: usize,
    pub kind: ErrorKind,
    pub message: String,
}
