//! Launch records as seen by the scheduler.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time::parse_launch_time;

pub const LAUNCH_PAGE_URL: &str = "https://www.rocketlaunch.live/launch";

/// One upcoming launch from the event source.
///
/// Times are kept as published; [`LaunchRecord::scheduled_time`] resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub slug: String,
    pub name: String,
    /// Exact liftoff time, when the provider has committed to one.
    pub t0: Option<String>,
    /// Opening of the launch window.
    pub win_open: Option<String>,
    /// Human estimate used when no time is known ("NET March").
    pub date_str: String,
    pub mission_description: Option<String>,
    pub vehicle: String,
    pub provider: String,
    pub pad: Option<String>,
    pub location: Option<String>,
    pub media: Vec<String>,
}

impl LaunchRecord {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_win_open(mut self, win_open: impl Into<String>) -> Self {
        self.win_open = Some(win_open.into());
        self
    }

    pub fn with_t0(mut self, t0: impl Into<String>) -> Self {
        self.t0 = Some(t0.into());
        self
    }

    /// `t0` if it parses, else `win_open`, else `None`.
    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.t0
            .as_deref()
            .and_then(parse_launch_time)
            .or_else(|| self.win_open.as_deref().and_then(parse_launch_time))
    }

    /// Seconds remaining until launch; negative once it has passed.
    pub fn seconds_to_launch(&self, now: DateTime<Utc>) -> Option<i64> {
        self.scheduled_time().map(|t| (t - now).num_seconds())
    }

    /// Launching within `window` from now (and not yet launched).
    pub fn is_launching_soon(&self, now: DateTime<Utc>, window: Duration) -> bool {
        matches!(self.seconds_to_launch(now), Some(s) if s > 0 && s <= window.num_seconds())
    }

    /// Launched no longer than `window` ago.
    pub fn has_launched_recently(&self, now: DateTime<Utc>, window: Duration) -> bool {
        matches!(self.seconds_to_launch(now), Some(s) if s <= 0 && -s <= window.num_seconds())
    }

    /// Whether the launch falls on the same calendar day as `now` in `tz`.
    pub fn is_on_day_of(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.scheduled_time()
            .map(|t| t.with_timezone(&tz).date_naive() == now.with_timezone(&tz).date_naive())
            .unwrap_or(false)
    }

    pub fn url(&self) -> String {
        format!("{LAUNCH_PAGE_URL}/{}", self.slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn t0_wins_over_window() {
        let launch = LaunchRecord::new("falcon-9", "Starlink")
            .with_win_open("2018-02-12T14:00Z")
            .with_t0("2018-02-12T14:30Z");
        assert_eq!(
            launch.scheduled_time(),
            Some(Utc.with_ymd_and_hms(2018, 2, 12, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_t0_falls_back_to_window() {
        let launch = LaunchRecord::new("falcon-9", "Starlink")
            .with_win_open("2018-02-12T14:00Z")
            .with_t0("TBD");
        assert_eq!(
            launch.scheduled_time(),
            Some(Utc.with_ymd_and_hms(2018, 2, 12, 14, 0, 0).unwrap())
        );
        assert_eq!(LaunchRecord::new("x", "x").scheduled_time(), None);
    }

    #[test]
    fn soon_and_recent_windows() {
        let launch = LaunchRecord::new("a", "A").with_win_open("2018-02-12T14:00Z");
        let day = Duration::hours(24);

        let before = Utc.with_ymd_and_hms(2018, 2, 12, 8, 0, 0).unwrap();
        assert!(launch.is_launching_soon(before, day));
        assert!(!launch.has_launched_recently(before, day));

        let after = Utc.with_ymd_and_hms(2018, 2, 12, 15, 0, 0).unwrap();
        assert!(!launch.is_launching_soon(after, day));
        assert!(launch.has_launched_recently(after, day));

        let long_before = Utc.with_ymd_and_hms(2018, 2, 1, 0, 0, 0).unwrap();
        assert!(!launch.is_launching_soon(long_before, day));
    }

    #[test]
    fn same_day_depends_on_timezone() {
        let launch = LaunchRecord::new("a", "A").with_win_open("2018-02-13T02:00Z");
        let now = Utc.with_ymd_and_hms(2018, 2, 12, 20, 0, 0).unwrap();
        assert!(!launch.is_on_day_of(now, chrono_tz::UTC));
        assert!(launch.is_on_day_of(now, chrono_tz::America::Chicago));
    }
}
