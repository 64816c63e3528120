use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::error::SinkConfigError;
use crate::writer::MessageWriter;

/// Where message lines are sent.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkTarget {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Sink selection, resolved once at startup and injected into the writer.
///
/// ```toml
/// target = "file"
/// path = "out/messages.jsonl"
/// append = true
/// flush_each_line = false
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    pub target: SinkTarget,
    pub path: Option<PathBuf>,
    pub append: bool,
    pub flush_each_line: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            target: SinkTarget::Stdout,
            path: None,
            append: false,
            flush_each_line: true,
        }
    }
}

impl SinkConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, SinkConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: SinkTarget::File,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Opens the configured sink and wraps it in a [`MessageWriter`].
    pub fn open(&self) -> Result<MessageWriter<Box<dyn Write + Send>>, SinkConfigError> {
        let sink: Box<dyn Write + Send> = match self.target {
            SinkTarget::Stdout => Box::new(io::stdout()),
            SinkTarget::Stderr => Box::new(io::stderr()),
            SinkTarget::File => {
                let path = self.path.as_ref().ok_or(SinkConfigError::MissingPath)?;
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(self.append)
                    .truncate(!self.append)
                    .open(path)
                    .map_err(|source| SinkConfigError::Open {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), append = self.append, "opened file sink");
                Box::new(file)
            }
        };
        Ok(MessageWriter::new(sink).flush_each_line(self.flush_each_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_flushed_stdout() {
        let cfg = SinkConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, SinkConfig::default());
        assert_eq!(cfg.target, SinkTarget::Stdout);
        assert!(cfg.flush_each_line);
    }

    #[test]
    fn parses_file_target() {
        let cfg = SinkConfig::from_toml_str(
            "target = \"file\"\npath = \"out.jsonl\"\nappend = true\nflush_each_line = false\n",
        )
        .unwrap();
        assert_eq!(cfg.target, SinkTarget::File);
        assert_eq!(cfg.path.as_deref(), Some(std::path::Path::new("out.jsonl")));
        assert!(cfg.append);
        assert!(!cfg.flush_each_line);
    }

    #[test]
    fn rejects_unknown_keys_and_missing_path() {
        assert!(matches!(
            SinkConfig::from_toml_str("colour = \"red\""),
            Err(SinkConfigError::Parse(_))
        ));
        let cfg = SinkConfig {
            target: SinkTarget::File,
            ..SinkConfig::default()
        };
        assert!(matches!(cfg.open(), Err(SinkConfigError::MissingPath)));
    }
}
