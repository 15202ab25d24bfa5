use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("event end time {end} is not after start time {start}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Fixed start/end timestamps bounding when the gated content is viewable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl EventWindow {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self, WindowError> {
        if end_time <= start_time {
            return Err(WindowError::Inverted {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    /// Event status as a pure function of the window and the current time.
    /// Exactly one status holds for any `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> EventStatus {
        if now >= self.end_time {
            EventStatus::Concluded
        } else if now >= self.start_time {
            EventStatus::Live
        } else {
            EventStatus::Pending
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Live,
    Concluded,
}

impl EventStatus {
    /// Ordering of the one-way pending → live → concluded progression.
    pub fn rank(self) -> u8 {
        match self {
            EventStatus::Pending => 0,
            EventStatus::Live => 1,
            EventStatus::Concluded => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn window() -> EventWindow {
        let start = Utc.with_ymd_and_hms(2025, 7, 21, 21, 0, 0).unwrap();
        EventWindow::new(start, start + Duration::hours(2)).unwrap()
    }

    #[test]
    fn test_inverted_window_rejected() {
        let start = Utc.with_ymd_and_hms(2025, 7, 21, 21, 0, 0).unwrap();
        assert!(EventWindow::new(start, start).is_err());
        assert!(EventWindow::new(start, start - Duration::seconds(1)).is_err());
    }

    #[test]
    fn test_status_truth_table() {
        let w = window();

        assert_eq!(
            w.status_at(w.start_time - Duration::minutes(10)),
            EventStatus::Pending
        );
        assert_eq!(w.status_at(w.start_time), EventStatus::Live);
        assert_eq!(
            w.status_at(w.start_time + Duration::hours(1)),
            EventStatus::Live
        );
        assert_eq!(
            w.status_at(w.end_time - Duration::seconds(1)),
            EventStatus::Live
        );
        assert_eq!(w.status_at(w.end_time), EventStatus::Concluded);
        assert_eq!(
            w.status_at(w.end_time + Duration::seconds(1)),
            EventStatus::Concluded
        );
    }

    #[test]
    fn test_exactly_one_status_holds() {
        let w = window();
        let samples = [
            w.start_time - Duration::days(1),
            w.start_time - Duration::seconds(1),
            w.start_time,
            w.start_time + Duration::minutes(30),
            w.end_time - Duration::seconds(1),
            w.end_time,
            w.end_time + Duration::days(1),
        ];

        for now in samples {
            let status = w.status_at(now);
            let pending = now < w.start_time;
            let live = now >= w.start_time && now < w.end_time;
            let concluded = now >= w.end_time;

            assert_eq!(status == EventStatus::Pending, pending);
            assert_eq!(status == EventStatus::Live, live);
            assert_eq!(status == EventStatus::Concluded, concluded);
        }
    }

    #[test]
    fn test_transitions_monotonic_under_increasing_clock() {
        let w = window();
        let mut last_rank = 0u8;
        let mut now = w.start_time - Duration::minutes(5);

        while now <= w.end_time + Duration::minutes(5) {
            let rank = w.status_at(now).rank();
            assert!(rank >= last_rank, "status went backwards at {}", now);
            last_rank = rank;
            now += Duration::seconds(30);
        }
        assert_eq!(last_rank, EventStatus::Concluded.rank());
    }
}
