use crate::lifecycle::status::{EventStatus, EventWindow};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// Handle to a running lifecycle task.
pub struct LifecycleHandle {
    conclude_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl LifecycleHandle {
    /// Channel the end countdown uses to request the concluded transition
    /// without waiting for the next poll.
    pub fn conclude_sender(&self) -> mpsc::Sender<()> {
        self.conclude_tx.clone()
    }

    pub async fn wait(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Start the event lifecycle state machine.
///
/// The initial status is computed immediately; a fixed-interval tick
/// re-evaluates it from the wall clock. The status only ever advances
/// (pending → live → concluded); concluded is terminal and stops the task.
pub fn spawn_lifecycle(
    window: EventWindow,
    tick_interval: Duration,
) -> (watch::Receiver<EventStatus>, LifecycleHandle) {
    let initial = window.status_at(Utc::now());
    let (status_tx, status_rx) = watch::channel(initial);
    let (conclude_tx, conclude_rx) = mpsc::channel(1);

    let task = tokio::spawn(run_lifecycle(window, tick_interval, status_tx, conclude_rx));

    (
        status_rx,
        LifecycleHandle {
            conclude_tx,
            task,
        },
    )
}

async fn run_lifecycle(
    window: EventWindow,
    tick_interval: Duration,
    status_tx: watch::Sender<EventStatus>,
    mut conclude_rx: mpsc::Receiver<()>,
) {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        let status = tokio::select! {
            _ = interval.tick() => window.status_at(Utc::now()),
            Some(()) = conclude_rx.recv() => EventStatus::Concluded,
        };

        let current = *status_tx.borrow();
        // One-way progression; a skewed clock never moves the status back
        if status.rank() > current.rank() {
            info!(from = ?current, to = ?status, "Event status transition");
            status_tx.send_replace(status);
        }

        if *status_tx.borrow() == EventStatus::Concluded {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_initial_status_published_immediately() {
        let now = Utc::now();
        let window = EventWindow::new(
            now + ChronoDuration::hours(1),
            now + ChronoDuration::hours(2),
        )
        .unwrap();

        let (status_rx, handle) = spawn_lifecycle(window, Duration::from_millis(50));
        assert_eq!(*status_rx.borrow(), EventStatus::Pending);
        handle.abort();
    }

    #[tokio::test]
    async fn test_progresses_through_all_states() {
        let now = Utc::now();
        let window = EventWindow::new(
            now + ChronoDuration::milliseconds(100),
            now + ChronoDuration::milliseconds(250),
        )
        .unwrap();

        let (mut status_rx, handle) = spawn_lifecycle(window, Duration::from_millis(20));
        assert_eq!(*status_rx.borrow(), EventStatus::Pending);

        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow(), EventStatus::Live);

        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow(), EventStatus::Concluded);

        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_conclude_request_short_circuits_poll() {
        let now = Utc::now();
        // Live window that would not conclude on its own for an hour
        let window = EventWindow::new(
            now - ChronoDuration::minutes(1),
            now + ChronoDuration::hours(1),
        )
        .unwrap();

        let (mut status_rx, handle) = spawn_lifecycle(window, Duration::from_secs(3600));
        assert_eq!(*status_rx.borrow(), EventStatus::Live);

        handle.conclude_sender().send(()).await.unwrap();

        status_rx.changed().await.unwrap();
        assert_eq!(*status_rx.borrow(), EventStatus::Concluded);

        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_concluded_is_terminal() {
        let now = Utc::now();
        let window = EventWindow::new(
            now - ChronoDuration::hours(2),
            now - ChronoDuration::hours(1),
        )
        .unwrap();

        let (status_rx, handle) = spawn_lifecycle(window, Duration::from_millis(10));
        assert_eq!(*status_rx.borrow(), EventStatus::Concluded);

        // Task exits on its own once concluded
        handle.wait().await.unwrap();
    }
}
