use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;
use streamgate::config::types::NotificationConfig;
use streamgate::lifecycle::countdown::run_end_countdown;
use streamgate::lifecycle::{format_remaining, spawn_lifecycle, EventStatus, EventWindow};
use streamgate::notify::NotificationGate;
use tokio::time::timeout;

#[test]
fn test_view_branch_for_two_hour_window() {
    let start = Utc.with_ymd_and_hms(2025, 7, 21, 21, 0, 0).unwrap();
    let window = EventWindow::new(start, start + ChronoDuration::hours(2)).unwrap();

    // Ten minutes before start: pending branch with a 10-minute countdown
    let now = start - ChronoDuration::minutes(10);
    assert_eq!(window.status_at(now), EventStatus::Pending);
    assert_eq!(format_remaining(window.start_time - now), "10m 0s");

    // One hour in: live branch, player mounted
    let now = start + ChronoDuration::hours(1);
    assert_eq!(window.status_at(now), EventStatus::Live);

    // One second past the end: concluded branch
    let now = start + ChronoDuration::hours(2) + ChronoDuration::seconds(1);
    assert_eq!(window.status_at(now), EventStatus::Concluded);
}

#[tokio::test]
async fn test_lifecycle_walks_pending_live_concluded() {
    let now = Utc::now();
    let window = EventWindow::new(
        now + ChronoDuration::milliseconds(120),
        now + ChronoDuration::milliseconds(300),
    )
    .unwrap();

    let (mut status_rx, handle) = spawn_lifecycle(window, Duration::from_millis(25));

    let mut seen = vec![*status_rx.borrow()];
    while status_rx.changed().await.is_ok() {
        seen.push(*status_rx.borrow());
        if *status_rx.borrow() == EventStatus::Concluded {
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            EventStatus::Pending,
            EventStatus::Live,
            EventStatus::Concluded
        ]
    );

    handle.wait().await.unwrap();
}

#[tokio::test]
async fn test_end_countdown_requests_conclusion_directly() {
    let now = Utc::now();
    let window = EventWindow::new(
        now - ChronoDuration::minutes(5),
        now + ChronoDuration::milliseconds(150),
    )
    .unwrap();

    // Status poll is far too slow to notice the end on its own
    let (mut status_rx, handle) = spawn_lifecycle(window, Duration::from_secs(3600));
    assert_eq!(*status_rx.borrow(), EventStatus::Live);

    let gate = NotificationGate::new(&NotificationConfig {
        enabled: false,
        assume_granted: false,
        local_dev: false,
    });
    tokio::spawn(run_end_countdown(
        window,
        Duration::from_millis(20),
        gate,
        handle.conclude_sender(),
    ));

    timeout(Duration::from_secs(2), status_rx.changed())
        .await
        .expect("countdown should conclude the lifecycle")
        .unwrap();
    assert_eq!(*status_rx.borrow(), EventStatus::Concluded);

    handle.wait().await.unwrap();
}
