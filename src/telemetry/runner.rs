use crate::telemetry::record::LogRecord;
use crate::telemetry::retry::RetryQueue;
use crate::telemetry::session::{SessionConfig, TelemetrySession};
use crate::telemetry::sink::LogSink;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_queued_batches: usize,
}

/// Wire a telemetry session to a delivery task feeding the given sink.
///
/// Dropping every clone of the returned session closes the channel; the
/// delivery task then drains what it holds and exits.
pub fn spawn_telemetry(
    session_config: SessionConfig,
    delivery_config: DeliveryConfig,
    sink: Arc<dyn LogSink>,
) -> (Arc<TelemetrySession>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(delivery_config.max_queued_batches.max(1));
    let session = TelemetrySession::new(session_config, tx);
    let handle = tokio::spawn(run_delivery(rx, sink, delivery_config));

    (session, handle)
}

/// Delivery task: receives flushed batches and pushes them through the
/// bounded retry queue until delivered or dropped.
pub async fn run_delivery(
    mut rx: mpsc::Receiver<Vec<LogRecord>>,
    sink: Arc<dyn LogSink>,
    config: DeliveryConfig,
) {
    let mut queue = RetryQueue::new(config.max_queued_batches, config.max_attempts);

    while let Some(records) = rx.recv().await {
        if let Some(dropped) = queue.enqueue(records) {
            warn!(
                batch_id = %dropped.batch_id,
                records = dropped.records.len(),
                "Retry queue full, dropping oldest batch"
            );
        }

        drain(&mut queue, sink.as_ref(), &config).await;
    }

    debug!("Delivery channel closed, delivery task exiting");
}

async fn drain(queue: &mut RetryQueue, sink: &dyn LogSink, config: &DeliveryConfig) {
    while let Some(batch) = queue.pop() {
        match sink.send(&batch.records).await {
            Ok(()) => {
                debug!(
                    batch_id = %batch.batch_id,
                    records = batch.records.len(),
                    "Delivered log batch"
                );
            }
            Err(e) => {
                warn!(
                    batch_id = %batch.batch_id,
                    attempt = batch.attempts + 1,
                    error = %e,
                    "Log batch delivery failed"
                );

                let backoff = backoff_for(config.initial_backoff, batch.attempts);
                match queue.requeue(batch) {
                    Some(dropped) => {
                        error!(
                            batch_id = %dropped.batch_id,
                            records = dropped.records.len(),
                            attempts = dropped.attempts,
                            "Dropping log batch, max delivery attempts exceeded"
                        );
                    }
                    None => tokio::time::sleep(backoff).await,
                }
            }
        }
    }
}

fn backoff_for(initial: Duration, failures: u32) -> Duration {
    let factor = 2u32.saturating_pow(failures);
    std::cmp::min(initial.saturating_mul(factor), Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let initial = Duration::from_secs(1);

        assert_eq!(backoff_for(initial, 0), Duration::from_secs(1));
        assert_eq!(backoff_for(initial, 1), Duration::from_secs(2));
        assert_eq!(backoff_for(initial, 3), Duration::from_secs(8));
        assert_eq!(backoff_for(initial, 10), Duration::from_secs(60));
    }
}
