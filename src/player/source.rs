use crate::player::events::PlayerEvent;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open player event feed: {0}")]
    Io(#[from] std::io::Error),
}

const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Reads newline-delimited JSON player events from a file, standing in for
/// a live player engine's event surface.
///
/// With `follow` the feed is tailed: on end-of-file the reader waits for
/// more lines instead of stopping, so a running player process can keep
/// appending events.
pub struct PlayerEventSource {
    path: PathBuf,
    follow: bool,
}

impl PlayerEventSource {
    pub fn new(path: PathBuf, follow: bool) -> Self {
        Self { path, follow }
    }

    pub async fn run(self, tx: mpsc::Sender<PlayerEvent>) -> Result<(), SourceError> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("'{}': {}", self.path.display(), e),
            )
        })?;
        let mut reader = BufReader::new(file);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;

            if n == 0 {
                if !self.follow {
                    break;
                }
                tokio::time::sleep(FOLLOW_POLL_INTERVAL).await;
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<PlayerEvent>(trimmed) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Binder gone, nothing left to feed
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, line = trimmed, "Dropping unparseable player event");
                }
            }
        }

        debug!(path = %self.path.display(), "Player event feed finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_reads_events_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"event":"waiting"}}"#).unwrap();
        writeln!(file, r#"{{"event":"playing"}}"#).unwrap();
        writeln!(file, r#"{{"event":"pause"}}"#).unwrap();
        file.flush().unwrap();

        let source = PlayerEventSource::new(file.path().to_path_buf(), false);
        let (tx, mut rx) = mpsc::channel(16);
        source.run(tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(PlayerEvent::Waiting));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Playing));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Pause));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_skips_blank_and_malformed_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"event":"seeking"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, r#"{{"event":"dispose"}}"#).unwrap();
        file.flush().unwrap();

        let source = PlayerEventSource::new(file.path().to_path_buf(), false);
        let (tx, mut rx) = mpsc::channel(16);
        source.run(tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(PlayerEvent::Seeking));
        assert_eq!(rx.recv().await, Some(PlayerEvent::Dispose));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source =
            PlayerEventSource::new(PathBuf::from("/nonexistent/events.ndjson"), false);
        let (tx, _rx) = mpsc::channel(16);

        assert!(source.run(tx).await.is_err());
    }
}
