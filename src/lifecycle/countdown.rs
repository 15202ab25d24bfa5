use crate::lifecycle::status::EventWindow;
use crate::notify::NotificationGate;
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Format remaining time the way the countdown displays it: the largest
/// nonzero unit leads, seconds always shown.
pub fn format_remaining(remaining: chrono::Duration) -> String {
    let total_secs = remaining.num_seconds().max(0);
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// End-of-event notification thresholds: 5..1 minutes remaining, then 60
/// and 30 seconds. Each fires at most once per countdown instance, however
/// often the tick re-evaluates the same remaining-time bucket.
#[derive(Debug, Default)]
pub struct ThresholdNotifier {
    sent: HashSet<u32>,
}

impl ThresholdNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notification body due at this remaining time, if any.
    pub fn check(&mut self, remaining: chrono::Duration) -> Option<String> {
        let total_secs = remaining.num_seconds();
        if total_secs <= 0 {
            return None;
        }

        if total_secs <= 30 {
            if self.sent.insert(30) {
                return Some(format!("Event will end in {} seconds.", total_secs));
            }
        } else if total_secs <= 60 {
            if self.sent.insert(60) {
                return Some("Event will end in 1 minute.".to_string());
            }
        } else {
            let minutes = (total_secs / 60) as u32;
            if (1..=5).contains(&minutes) && self.sent.insert(minutes) {
                return Some(format!("Event will end in {} minutes.", minutes));
            }
        }

        None
    }
}

/// End-countdown task for the live branch.
///
/// Requests notification permission once at mount, fires threshold
/// notifications through the gate, and on reaching zero requests the
/// concluded transition directly rather than waiting for the next status
/// poll.
pub async fn run_end_countdown(
    window: EventWindow,
    tick_interval: Duration,
    mut gate: NotificationGate,
    conclude_tx: mpsc::Sender<()>,
) {
    let permission = gate.request_permission();
    debug!(?permission, "End countdown started");

    let mut thresholds = ThresholdNotifier::new();
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        interval.tick().await;

        let remaining = window.end_time - Utc::now();
        if remaining <= chrono::Duration::zero() {
            info!("Event end reached, requesting concluded transition");
            let _ = conclude_tx.send(()).await;
            break;
        }

        if let Some(body) = thresholds.check(remaining) {
            gate.send("Event Ending Soon!", &body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_remaining_buckets() {
        assert_eq!(
            format_remaining(Duration::days(1) + Duration::hours(2) + Duration::seconds(5)),
            "1d 2h 0m 5s"
        );
        assert_eq!(
            format_remaining(Duration::hours(1) + Duration::minutes(30)),
            "1h 30m 0s"
        );
        assert_eq!(
            format_remaining(Duration::minutes(10) + Duration::seconds(3)),
            "10m 3s"
        );
        assert_eq!(format_remaining(Duration::seconds(45)), "45s");
        assert_eq!(format_remaining(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_each_threshold_fires_at_most_once() {
        let mut thresholds = ThresholdNotifier::new();
        let mut fired = Vec::new();

        // Sweep from 6 minutes down to zero in 5-second ticks
        let mut remaining = 360i64;
        while remaining > 0 {
            if let Some(body) = thresholds.check(Duration::seconds(remaining)) {
                fired.push(body);
            }
            remaining -= 5;
        }

        assert_eq!(
            fired,
            vec![
                "Event will end in 5 minutes.",
                "Event will end in 4 minutes.",
                "Event will end in 3 minutes.",
                "Event will end in 2 minutes.",
                "Event will end in 1 minutes.",
                "Event will end in 1 minute.",
                "Event will end in 30 seconds.",
            ]
        );
    }

    #[test]
    fn test_repeated_same_bucket_does_not_refire() {
        let mut thresholds = ThresholdNotifier::new();

        assert!(thresholds.check(Duration::seconds(290)).is_some());
        assert!(thresholds.check(Duration::seconds(289)).is_none());
        assert!(thresholds.check(Duration::seconds(250)).is_none());
    }

    #[test]
    fn test_thirty_second_body_carries_exact_seconds() {
        let mut thresholds = ThresholdNotifier::new();

        let body = thresholds.check(Duration::seconds(17)).unwrap();
        assert_eq!(body, "Event will end in 17 seconds.");
    }

    #[test]
    fn test_no_notification_at_or_past_zero() {
        let mut thresholds = ThresholdNotifier::new();

        assert!(thresholds.check(Duration::zero()).is_none());
        assert!(thresholds.check(Duration::seconds(-10)).is_none());
    }

    #[test]
    fn test_joining_late_skips_earlier_thresholds() {
        let mut thresholds = ThresholdNotifier::new();

        // First observation is already inside the 30s bucket
        let body = thresholds.check(Duration::seconds(20)).unwrap();
        assert_eq!(body, "Event will end in 20 seconds.");
        assert!(thresholds.check(Duration::seconds(10)).is_none());
    }
}
