//! Monitor registry: derives the persisted monitor set from the current
//! subscribers and upcoming launches, and picks out the monitors that are due.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::launch::LaunchRecord;
use crate::monitor::{Monitor, MonitorKey, MonitorRecord};
use crate::ports::ConfigResolver;
use crate::subscriber::SubscriberKey;

/// Rebuild the full monitor set.
///
/// One monitor per enabled subscriber and upcoming launch with a known time.
/// `last_alert` carries over from `existing`, and `just_alerted` overrides
/// both. Launches that left the upcoming batch are dropped by omission.
pub fn reconcile(
    enabled_subscribers: &[SubscriberKey],
    upcoming: &[LaunchRecord],
    existing: &[Monitor],
    just_alerted: &[Monitor],
) -> Vec<Monitor> {
    let mut last_alerts: HashMap<MonitorKey, Option<DateTime<Utc>>> = HashMap::new();
    for monitor in existing.iter().chain(just_alerted) {
        last_alerts.insert(monitor.key(), monitor.last_alert);
    }

    let timed: Vec<(&LaunchRecord, DateTime<Utc>)> = upcoming
        .iter()
        .filter_map(|launch| match launch.scheduled_time() {
            Some(t) => Some((launch, t)),
            None => {
                debug!(slug = %launch.slug, "launch has no scheduled time yet; not monitoring");
                None
            }
        })
        .collect();

    let mut monitors = Vec::with_capacity(enabled_subscribers.len() * timed.len());
    for subscriber in enabled_subscribers {
        for (launch, launch_time) in &timed {
            let mut monitor = Monitor::new(subscriber.clone(), launch.slug.clone(), *launch_time);
            if let Some(last_alert) = last_alerts.get(&monitor.key()) {
                monitor.last_alert = *last_alert;
            }
            monitors.push(monitor);
        }
    }
    monitors
}

/// The existing monitor set with `last_alert` taken from `just_alerted`.
///
/// Used when no upcoming batch is available: nothing is added or dropped.
pub fn apply_alerts(existing: &[Monitor], just_alerted: &[Monitor]) -> Vec<Monitor> {
    let alerted: HashMap<MonitorKey, Option<DateTime<Utc>>> =
        just_alerted.iter().map(|m| (m.key(), m.last_alert)).collect();
    existing
        .iter()
        .map(|monitor| {
            let mut monitor = monitor.clone();
            if let Some(last_alert) = alerted.get(&monitor.key()) {
                monitor.last_alert = *last_alert;
            }
            monitor
        })
        .collect()
}

/// Persisted monitors whose alert is due at `now` under current offsets.
pub fn load_due(
    persisted: &[MonitorRecord],
    resolver: &dyn ConfigResolver,
    now: DateTime<Utc>,
) -> Vec<Monitor> {
    describe(persisted, resolver, now)
        .into_iter()
        .filter(|(_, next)| matches!(next, Some(at) if *at < now))
        .map(|(monitor, _)| monitor)
        .collect()
}

/// Every persisted monitor with its next alert instant.
///
/// Monitors whose subscriber offsets cannot be resolved are left out.
pub fn describe(
    persisted: &[MonitorRecord],
    resolver: &dyn ConfigResolver,
    now: DateTime<Utc>,
) -> Vec<(Monitor, Option<DateTime<Utc>>)> {
    let mut offsets_by_subscriber = HashMap::new();
    let mut out = Vec::with_capacity(persisted.len());

    for record in persisted {
        let monitor = Monitor::load(record.clone());
        let offsets = offsets_by_subscriber
            .entry(monitor.subscriber.clone())
            .or_insert_with(|| resolver.offsets(&monitor.subscriber));
        match offsets {
            Ok(offsets) => {
                let next = monitor.next_alert(offsets, now);
                out.push((monitor, next));
            }
            Err(e) => warn!(
                subscriber = %monitor.subscriber,
                slug = %monitor.launch_slug,
                error = %e,
                "skipping monitor with unresolvable alert times"
            ),
        }
    }
    out
}
