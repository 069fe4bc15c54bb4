//! Monitors and the alert-due evaluator.
//!
//! A [`Monitor`] pairs one subscriber with one upcoming launch and remembers
//! when that subscriber was last alerted about it. Alert instants are never
//! stored: they are derived from the subscriber's current offsets and the
//! launch's current time every time they are needed, so edits to either take
//! effect on the next tick.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::offsets::AlertOffsets;
use crate::subscriber::SubscriberKey;
use crate::time::iso_format;

/// Identity of a monitor for reconciliation: subscriber and launch, no times.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorKey {
    pub subscriber: SubscriberKey,
    pub launch_slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub subscriber: SubscriberKey,
    pub launch_slug: String,
    pub launch_time: DateTime<Utc>,
    pub last_alert: Option<DateTime<Utc>>,
}

impl Monitor {
    pub fn new(
        subscriber: SubscriberKey,
        launch_slug: impl Into<String>,
        launch_time: DateTime<Utc>,
    ) -> Self {
        Self {
            subscriber,
            launch_slug: launch_slug.into(),
            launch_time,
            last_alert: None,
        }
    }

    pub fn with_last_alert(mut self, last_alert: Option<DateTime<Utc>>) -> Self {
        self.last_alert = last_alert;
        self
    }

    pub fn key(&self) -> MonitorKey {
        MonitorKey {
            subscriber: self.subscriber.clone(),
            launch_slug: self.launch_slug.clone(),
        }
    }

    pub fn schedule(&self, offsets: &AlertOffsets) -> AlertSchedule {
        AlertSchedule::new(self.launch_time, offsets)
    }

    pub fn next_alert(&self, offsets: &AlertOffsets, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule(offsets).next_alert(now, self.last_alert)
    }

    pub fn is_alert_due(&self, offsets: &AlertOffsets, now: DateTime<Utc>) -> bool {
        self.schedule(offsets).is_due(now, self.last_alert)
    }

    /// Record an alert at `now`, truncated to whole seconds to match storage.
    pub fn mark_alerted(&mut self, now: DateTime<Utc>) {
        let truncated = now.duration_trunc(TimeDelta::seconds(1)).unwrap_or(now);
        self.last_alert = Some(truncated);
    }

    pub fn dump(&self) -> MonitorRecord {
        MonitorRecord {
            subscriber_scope: self.subscriber.scope().map(str::to_string),
            subscriber_key: self.subscriber.target_id().to_string(),
            event_slug: self.launch_slug.clone(),
            event_time: self.launch_time,
            last_alert_time: self.last_alert,
        }
    }

    pub fn load(record: MonitorRecord) -> Self {
        Self {
            subscriber: SubscriberKey::from_parts(
                record.subscriber_scope.as_deref(),
                &record.subscriber_key,
            ),
            launch_slug: record.event_slug,
            launch_time: record.event_time,
            last_alert: record.last_alert_time,
        }
    }
}

/// Persisted form of a [`Monitor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorRecord {
    /// Server id for channel subscribers, null for direct-message users.
    pub subscriber_scope: Option<String>,
    pub subscriber_key: String,
    pub event_slug: String,
    #[serde(with = "iso_format")]
    pub event_time: DateTime<Utc>,
    #[serde(with = "iso_format::option", default)]
    pub last_alert_time: Option<DateTime<Utc>>,
}

/// Absolute alert instants for one launch under one subscriber's offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSchedule {
    instants: Vec<DateTime<Utc>>,
}

impl AlertSchedule {
    pub fn new(launch_time: DateTime<Utc>, offsets: &AlertOffsets) -> Self {
        let mut instants: Vec<DateTime<Utc>> = offsets
            .as_slice()
            .iter()
            .filter_map(|d| launch_time.checked_sub_signed(*d))
            .collect();
        instants.sort();
        Self { instants }
    }

    /// Ascending alert instants; equal offsets produce equal entries.
    /// Instants before the earliest representable time are left out.
    pub fn instants(&self) -> &[DateTime<Utc>] {
        &self.instants
    }

    /// The single alert instant that matters at `now`.
    ///
    /// The most recent elapsed instant not yet covered by `last_alert` wins,
    /// so a subscriber who missed several marks gets one catch-up alert.
    /// Without one, the soonest future instant is returned. An instant exactly
    /// at `now` is neither elapsed nor upcoming.
    pub fn next_alert(
        &self,
        now: DateTime<Utc>,
        last_alert: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        let past_due = self
            .instants
            .iter()
            .rev()
            .find(|i| **i < now && last_alert.is_none_or(|last| **i > last))
            .copied();

        past_due.or_else(|| self.instants.iter().find(|i| **i > now).copied())
    }

    pub fn is_due(&self, now: DateTime<Utc>, last_alert: Option<DateTime<Utc>>) -> bool {
        matches!(self.next_alert(now, last_alert), Some(at) if at < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offsets::{DEFAULT_ALERT_TIMES, parse_offset_list};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 2, 12, h, m, 0).unwrap()
    }

    fn monitor(launch: DateTime<Utc>, last_alert: Option<DateTime<Utc>>) -> Monitor {
        Monitor::new(SubscriberKey::channel("360523650912223253", "general"), "test-slug", launch)
            .with_last_alert(last_alert)
    }

    fn offsets() -> AlertOffsets {
        parse_offset_list(DEFAULT_ALERT_TIMES).unwrap()
    }

    #[test]
    fn never_alerted_picks_most_recent_past_mark() {
        let m = monitor(at(14, 0), None);
        assert_eq!(m.next_alert(&offsets(), at(8, 10)), Some(at(8, 0)));
        assert!(m.is_alert_due(&offsets(), at(8, 10)));
    }

    #[test]
    fn one_missed_mark() {
        let m = monitor(at(14, 0), Some(at(2, 0)));
        assert_eq!(m.next_alert(&offsets(), at(8, 10)), Some(at(8, 0)));
        assert!(m.is_alert_due(&offsets(), at(8, 10)));
    }

    #[test]
    fn several_missed_marks_collapse_to_latest() {
        let m = monitor(at(8, 17), Some(at(2, 0)));
        assert_eq!(m.next_alert(&offsets(), at(8, 10)), Some(at(8, 2)));
        assert!(m.is_alert_due(&offsets(), at(8, 10)));
    }

    #[test]
    fn nothing_missed_returns_next_upcoming() {
        let m = monitor(at(9, 5), Some(at(8, 9)));
        assert_eq!(m.next_alert(&offsets(), at(8, 10)), Some(at(8, 50)));
        assert!(!m.is_alert_due(&offsets(), at(8, 10)));
    }

    #[test]
    fn exhausted_marks_return_none() {
        let m = monitor(at(8, 15), Some(at(8, 5)));
        assert_eq!(m.next_alert(&offsets(), at(8, 10)), None);
        assert!(!m.is_alert_due(&offsets(), at(8, 10)));
    }

    #[test]
    fn instant_equal_to_now_is_neither_past_nor_future() {
        let one_hour: AlertOffsets = "1h".parse().unwrap();
        let m = monitor(at(9, 10), None);
        assert_eq!(m.next_alert(&one_hour, at(8, 10)), None);
        assert!(!m.is_alert_due(&one_hour, at(8, 10)));
    }

    #[test]
    fn instants_are_ascending_and_keep_duplicates() {
        let offsets: AlertOffsets = "1h, 60m, 15m".parse().unwrap();
        let schedule = AlertSchedule::new(at(14, 0), &offsets);
        assert_eq!(schedule.instants(), &[at(13, 0), at(13, 0), at(13, 45)]);
    }

    #[test]
    fn instants_outside_the_calendar_are_dropped() {
        let launch = DateTime::<Utc>::MIN_UTC + TimeDelta::days(30);
        let offsets: AlertOffsets = "99999w, 1d".parse().unwrap();
        let schedule = AlertSchedule::new(launch, &offsets);
        assert_eq!(schedule.instants(), &[launch - TimeDelta::days(1)]);

        let m = Monitor::new(SubscriberKey::user("42"), "far", launch);
        assert_eq!(m.next_alert(&offsets, launch), Some(launch - TimeDelta::days(1)));
    }

    #[test]
    fn marking_truncates_to_seconds() {
        let mut m = monitor(at(14, 0), None);
        let now = at(8, 10) + TimeDelta::milliseconds(750);
        m.mark_alerted(now);
        assert_eq!(m.last_alert, Some(at(8, 10)));
        assert!(!m.is_alert_due(&offsets(), now));
    }

    #[test]
    fn dump_matches_persisted_shape() {
        let m = monitor(at(14, 0), Some(at(2, 0)));
        let json = serde_json::to_value(m.dump()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "subscriberScope": "360523650912223253",
                "subscriberKey": "general",
                "eventSlug": "test-slug",
                "eventTime": "2018-02-12T14:00:00+0000",
                "lastAlertTime": "2018-02-12T02:00:00+0000"
            })
        );
    }

    #[test]
    fn load_dump_round_trip() {
        for m in [
            monitor(at(14, 0), Some(at(2, 0))),
            monitor(at(14, 0), None),
            Monitor::new(SubscriberKey::user("42"), "other", at(9, 5)),
        ] {
            let text = serde_json::to_string(&m.dump()).unwrap();
            let record: MonitorRecord = serde_json::from_str(&text).unwrap();
            assert_eq!(Monitor::load(record), m);
        }
    }

    #[test]
    fn key_ignores_times() {
        let a = monitor(at(14, 0), None);
        let b = monitor(at(15, 0), Some(at(2, 0)));
        assert_eq!(a.key(), b.key());
        assert_ne!(a, b);
    }
}
