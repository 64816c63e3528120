use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::MessageError;
use crate::message::Message;

/// Async counterpart of [`crate::MessageWriter`] for tokio sinks.
#[derive(Debug)]
pub struct AsyncMessageWriter<W: AsyncWrite + Unpin> {
    sink: W,
    flush_each_line: bool,
}

impl<W: AsyncWrite + Unpin> AsyncMessageWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            flush_each_line: true,
        }
    }

    pub fn flush_each_line(mut self, enable: bool) -> Self {
        self.flush_each_line = enable;
        self
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<(), MessageError> {
        let line = message.to_line()?;
        if let Err(err) = self.emit(&line).await {
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

    async fn emit(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.sink.write_all(line).await?;
        if self.flush_each_line {
            self.sink.flush().await?;
        }
        Ok(())
    }

    /// Stops at the first failure; earlier lines stay written.
    pub async fn write_messages<'a, I>(&mut self, messages: I) -> Result<(), MessageError>
    where
        I: IntoIterator<Item = &'a Message>,
    {
        for message in messages {
            self.write_message(message).await?;
        }
        Ok(())
    }
}
