#![forbid(unsafe_code)]
//! Consumer-side ingestion of line-delimited singer message streams.
//!
//! Reads any [`std::io::BufRead`] with a per-line size cap and yields one
//! [`LineRecord`] per non-blank line, each carrying either a parsed
//! [`singer_messages::Message`] or a classified failure. Lines are
//! independent, so one bad line never hides the ones after it.

mod config;
mod error;
mod ingest;
mod reader;

pub use config::{ErrorDetailCapture, IngestConfig, IngestLimits};
pub use error::{ErrorDetail, ErrorDetailSink, LineRecord, LineRecordError};
pub use ingest::MessageIngestor;
pub use reader::{BoundedLine, BoundedLineReader};
