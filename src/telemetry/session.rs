use crate::telemetry::record::{LogLevel, LogRecord};
use serde_json::json;
use std::sync::{Mutex, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Batch size that triggers an immediate flush
    pub batch_size: usize,
    /// Delay before a scheduled flush fires
    pub flush_interval: Duration,
}

/// Collects telemetry records for one viewer session and hands completed
/// batches to the delivery task.
///
/// `record` flushes immediately once the batch reaches `batch_size`
/// (cancelling any scheduled flush), and otherwise schedules a flush after
/// `flush_interval` if none is pending; at most one timer is outstanding at
/// a time. Play/pause events are counted rather than recorded and folded
/// into a single summary record at flush.
pub struct TelemetrySession {
    config: SessionConfig,
    inner: Mutex<Inner>,
    timer: Mutex<Option<JoinHandle<()>>>,
    outbound: mpsc::Sender<Vec<LogRecord>>,
    weak: Weak<TelemetrySession>,
}

struct Inner {
    batch: Vec<LogRecord>,
    play_count: u64,
    pause_count: u64,
    /// Reentrancy guard: a flush triggered while one is in progress is a no-op
    flushing: bool,
}

impl TelemetrySession {
    pub fn new(
        config: SessionConfig,
        outbound: mpsc::Sender<Vec<LogRecord>>,
    ) -> std::sync::Arc<Self> {
        std::sync::Arc::new_cyclic(|weak| Self {
            config,
            inner: Mutex::new(Inner {
                batch: Vec::new(),
                play_count: 0,
                pause_count: 0,
                flushing: false,
            }),
            timer: Mutex::new(None),
            outbound,
            weak: weak.clone(),
        })
    }

    /// Append a record stamped with the current time.
    pub fn record(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let entry = LogRecord::new(level, message, details);

        let batch_full = {
            let mut inner = self.inner.lock().unwrap();
            inner.batch.push(entry);
            inner.batch.len() >= self.config.batch_size
        };

        if batch_full {
            self.cancel_scheduled_flush();
            self.flush();
        } else {
            self.schedule_flush();
        }
    }

    /// Count a play event. Aggregated into the flush summary, not recorded
    /// at native event frequency.
    pub fn note_play(&self) {
        self.inner.lock().unwrap().play_count += 1;
    }

    /// Count a pause event.
    pub fn note_pause(&self) {
        self.inner.lock().unwrap().pause_count += 1;
    }

    /// Snapshot the batch (appending the play/pause summary if any events
    /// were counted) and hand it to delivery. No-op when there is nothing
    /// to send.
    pub fn flush(&self) {
        let batch = {
            let mut inner = self.inner.lock().unwrap();
            if inner.flushing {
                return;
            }
            if inner.batch.is_empty() && inner.play_count == 0 && inner.pause_count == 0 {
                return;
            }
            inner.flushing = true;

            if inner.play_count > 0 || inner.pause_count > 0 {
                let summary = LogRecord::new(
                    LogLevel::Info,
                    "[UI] Play/Pause summary",
                    Some(json!({
                        "playCount": inner.play_count,
                        "pauseCount": inner.pause_count,
                    })),
                );
                inner.batch.push(summary);
                inner.play_count = 0;
                inner.pause_count = 0;
            }

            // Swap-and-clear: records appended after this point land in the
            // next batch
            std::mem::take(&mut inner.batch)
        };

        match self.outbound.try_send(batch) {
            Ok(()) => debug!("Handed batch to delivery"),
            Err(mpsc::error::TrySendError::Full(batch)) => {
                warn!(records = batch.len(), "Delivery queue full, dropping batch");
            }
            Err(mpsc::error::TrySendError::Closed(batch)) => {
                warn!(records = batch.len(), "Delivery task gone, dropping batch");
            }
        }

        self.inner.lock().unwrap().flushing = false;
    }

    /// Teardown: cancel any pending timer and flush what remains.
    pub fn shutdown(&self) {
        self.cancel_scheduled_flush();
        self.flush();
    }

    /// True when a timer flush is pending.
    pub fn has_scheduled_flush(&self) -> bool {
        self.timer
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn schedule_flush(&self) {
        let mut timer = self.timer.lock().unwrap();
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        // The timer holds only a weak handle so an abandoned session can
        // still drop and close the delivery channel
        let weak = self.weak.clone();
        let delay = self.config.flush_interval;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(session) = weak.upgrade() {
                session.flush();
            }
        }));
    }

    fn cancel_scheduled_flush(&self) {
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for TelemetrySession {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_session(batch_size: usize) -> (
        std::sync::Arc<TelemetrySession>,
        mpsc::Receiver<Vec<LogRecord>>,
    ) {
        let (tx, rx) = mpsc::channel(8);
        let session = TelemetrySession::new(
            SessionConfig {
                batch_size,
                flush_interval: Duration::from_secs(60),
            },
            tx,
        );
        (session, rx)
    }

    #[tokio::test]
    async fn test_flush_empties_batch_without_losing_records() {
        let (session, mut rx) = make_session(30);

        for i in 0..5 {
            session.record(LogLevel::Info, format!("event {}", i), None);
        }
        session.flush();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].message, "event 0");

        // Second flush has nothing to send
        session.flush();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_size_trigger_flushes_and_cancels_timer() {
        let (session, mut rx) = make_session(3);

        session.record(LogLevel::Info, "one", None);
        session.record(LogLevel::Info, "two", None);
        assert!(session.has_scheduled_flush());

        session.record(LogLevel::Info, "three", None);

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 3);
        assert!(!session.has_scheduled_flush());
    }

    #[tokio::test]
    async fn test_scheduling_is_idempotent() {
        let (session, _rx) = make_session(30);

        session.record(LogLevel::Info, "one", None);
        session.record(LogLevel::Info, "two", None);

        // Only one timer outstanding regardless of how many records arrived
        assert!(session.has_scheduled_flush());
    }

    #[tokio::test]
    async fn test_timer_flush_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let session = TelemetrySession::new(
            SessionConfig {
                batch_size: 30,
                flush_interval: Duration::from_millis(20),
            },
            tx,
        );

        session.record(LogLevel::Info, "queued", None);
        tokio::time::sleep(Duration::from_millis(80)).await;

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_summary_appended_and_counters_reset() {
        let (session, mut rx) = make_session(30);

        session.record(LogLevel::Info, "[BUF] waiting", None);
        session.note_play();
        session.note_play();
        session.note_pause();
        session.flush();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 2);

        let summary = &batch[1];
        assert_eq!(summary.message, "[UI] Play/Pause summary");
        let details = summary.details.as_ref().unwrap();
        assert_eq!(details["playCount"], 2);
        assert_eq!(details["pauseCount"], 1);

        // Counters were reset; a follow-up flush is a no-op
        session.flush();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_counters_only_flush_emits_single_summary() {
        let (session, mut rx) = make_session(30);

        session.note_pause();
        session.flush();

        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].message, "[UI] Play/Pause summary");
    }

    #[tokio::test]
    async fn test_empty_flush_is_noop() {
        let (session, mut rx) = make_session(30);

        session.flush();
        assert!(rx.try_recv().is_err());
    }
}
