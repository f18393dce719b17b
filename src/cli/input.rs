//! Where session lines come from.
//!
//! Tokio reads stdin on a blocking thread that can't be interrupted, so a pending read would keep
//! the runtime from shutting down after Ctrl-C until Enter is pressed. [stdin_lines] reads on a
//! plain thread of its own instead and hands lines over through a channel, which can be dropped at
//! any point.

use std::io::BufRead;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, Lines},
    sync::mpsc::{self, UnboundedReceiver},
};
use tracing::debug;

/// A source of input lines. Reading has to be cancel safe, the session races it against shutdown.
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator, or `None` once input ended.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

#[async_trait]
impl<R> LineSource for Lines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> Result<Option<String>> {
        Lines::next_line(self).await.context("Failed to read input")
    }
}

#[async_trait]
impl LineSource for UnboundedReceiver<std::io::Result<String>> {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.recv().await.transpose().context("Failed to read input")
    }
}

/// Lines of stdin, read on a detached thread. The thread stops once stdin ends or the receiver is
/// dropped and a further line arrives.
pub fn stdin_lines() -> Result<UnboundedReceiver<std::io::Result<String>>> {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if sender.send(line).is_err() {
                    break;
                }
            }
            debug!("Stdin closed");
        })
        .context("Failed to start the stdin reader")?;
    Ok(receiver)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tokio::{io::AsyncBufReadExt, sync::mpsc};

    use super::LineSource;

    #[tokio::test]
    async fn reader_lines() -> Result<()> {
        let mut lines = "begin reading\n\nquit".as_bytes().lines();

        assert_eq!(lines.next_line().await?.as_deref(), Some("begin reading"));
        assert_eq!(lines.next_line().await?.as_deref(), Some(""));
        assert_eq!(lines.next_line().await?.as_deref(), Some("quit"));
        assert_eq!(LineSource::next_line(&mut lines).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn channel_lines_end_with_the_sender() -> Result<()> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        sender.send(Ok("status".to_string()))?;
        sender.send(Err(std::io::Error::other("broken pipe")))?;
        drop(sender);

        assert_eq!(receiver.next_line().await?.as_deref(), Some("status"));
        assert!(receiver.next_line().await.is_err());
        assert_eq!(receiver.next_line().await?, None);
        Ok(())
    }
}
