use crate::telemetry::record::LogRecord;
use std::collections::VecDeque;
use uuid::Uuid;

/// A flushed batch awaiting delivery.
#[derive(Debug)]
pub struct PendingBatch {
    /// Unique batch ID (for log correlation)
    pub batch_id: Uuid,
    pub records: Vec<LogRecord>,
    /// Failed delivery attempts so far
    pub attempts: u32,
}

/// Bounded queue of batches awaiting delivery.
///
/// Overflow drops the oldest batch; a batch that keeps failing is dropped
/// after `max_attempts` attempts. Both drops are returned to the caller for
/// logging.
pub struct RetryQueue {
    max_batches: usize,
    max_attempts: u32,
    queue: VecDeque<PendingBatch>,
}

impl RetryQueue {
    pub fn new(max_batches: usize, max_attempts: u32) -> Self {
        Self {
            max_batches,
            max_attempts,
            queue: VecDeque::new(),
        }
    }

    /// Add a freshly flushed batch. Returns the oldest batch if it had to be
    /// dropped to make room.
    pub fn enqueue(&mut self, records: Vec<LogRecord>) -> Option<PendingBatch> {
        let dropped = if self.queue.len() >= self.max_batches {
            self.queue.pop_front()
        } else {
            None
        };

        self.queue.push_back(PendingBatch {
            batch_id: Uuid::new_v4(),
            records,
            attempts: 0,
        });

        dropped
    }

    /// Take the next batch to attempt.
    pub fn pop(&mut self) -> Option<PendingBatch> {
        self.queue.pop_front()
    }

    /// Record a failed attempt. The batch is put back at the front for
    /// another try, or returned when its attempts are exhausted.
    pub fn requeue(&mut self, mut batch: PendingBatch) -> Option<PendingBatch> {
        batch.attempts += 1;
        if batch.attempts >= self.max_attempts {
            return Some(batch);
        }
        self.queue.push_front(batch);
        None
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
