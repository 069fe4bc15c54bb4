//! The polling alert loop.
//!
//! Each tick loads the persisted monitors, dispatches the ones that are due,
//! then rebuilds the monitor set from the current upcoming launches.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, StoreError};
use crate::monitor::{Monitor, MonitorRecord};
use crate::ports::{ConfigResolver, EventSource, MonitorStore, Notifier};
use crate::registry::{apply_alerts, load_due, reconcile};
use crate::subscriber::SubscriberKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    WaitingForStart,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub upcoming_count: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            upcoming_count: 5,
        }
    }
}

impl SchedulerSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_upcoming_count(mut self, upcoming_count: usize) -> Self {
        self.upcoming_count = upcoming_count;
        self
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Alerts handed to the notifier.
    pub dispatched: usize,
    /// Size of the new monitor set, or `None` when reconciliation was skipped.
    pub reconciled: Option<usize>,
}

pub struct AlertScheduler {
    source: Arc<dyn EventSource>,
    notifier: Arc<dyn Notifier>,
    resolver: Arc<dyn ConfigResolver>,
    store: Arc<dyn MonitorStore>,
    settings: SchedulerSettings,
    state: SchedulerState,
    dispatches: JoinSet<()>,
}

impl AlertScheduler {
    pub fn new(
        source: Arc<dyn EventSource>,
        notifier: Arc<dyn Notifier>,
        resolver: Arc<dyn ConfigResolver>,
        store: Arc<dyn MonitorStore>,
    ) -> Self {
        Self {
            source,
            notifier,
            resolver,
            store,
            settings: SchedulerSettings::default(),
            state: SchedulerState::WaitingForStart,
            dispatches: JoinSet::new(),
        }
    }

    pub fn with_settings(mut self, settings: SchedulerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Wait for the notifier, then tick on a fixed period forever.
    pub async fn run(&mut self) {
        if self.state == SchedulerState::WaitingForStart {
            info!(notifier = self.notifier.name(), "waiting for notifier");
            self.notifier.wait_until_ready().await;
            self.state = SchedulerState::Running;
        }
        info!(
            interval_secs = self.settings.interval.as_secs(),
            upcoming = self.settings.upcoming_count,
            "alert loop running"
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match self.tick(Utc::now()).await {
                Ok(report) => debug!(
                    dispatched = report.dispatched,
                    reconciled = ?report.reconciled,
                    "tick complete"
                ),
                Err(e) => warn!(error = %e, "tick failed; retrying next period"),
            }
        }
    }

    /// Run one pass of the loop at `now`.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport, StoreError> {
        self.reap_finished();

        let persisted = self.store.load_all()?;
        let mut just_alerted = load_due(&persisted, self.resolver.as_ref(), now);
        for monitor in &mut just_alerted {
            monitor.mark_alerted(now);
            info!(slug = %monitor.launch_slug, subscriber = %monitor.subscriber, "sending launch alert");
            self.spawn_dispatch(monitor.subscriber.clone(), monitor.launch_slug.clone());
        }
        let report = TickReport {
            dispatched: just_alerted.len(),
            reconciled: None,
        };

        let existing: Vec<Monitor> = persisted.into_iter().map(Monitor::load).collect();
        match self.rebuild(&existing, &just_alerted).await {
            Some(monitors) => {
                self.save(&monitors)?;
                Ok(TickReport {
                    reconciled: Some(monitors.len()),
                    ..report
                })
            }
            None => {
                if !just_alerted.is_empty() {
                    self.save(&apply_alerts(&existing, &just_alerted))?;
                }
                Ok(report)
            }
        }
    }

    /// Reconciled monitor set, or `None` when no upcoming batch or subscriber list is available.
    async fn rebuild(&self, existing: &[Monitor], just_alerted: &[Monitor]) -> Option<Vec<Monitor>> {
        let upcoming = match self.source.fetch_upcoming(self.settings.upcoming_count).await {
            Ok(upcoming) if upcoming.is_empty() => {
                warn!("event source returned no upcoming launches; keeping current monitors");
                return None;
            }
            Ok(upcoming) => upcoming,
            Err(e) => {
                warn!(error = %e, "could not fetch upcoming launches; keeping current monitors");
                return None;
            }
        };

        let subscribers = match self.resolver.enabled_subscribers() {
            Ok(subscribers) => subscribers,
            Err(e) => {
                warn!(error = %e, "could not list subscribers; keeping current monitors");
                return None;
            }
        };

        Some(reconcile(&subscribers, &upcoming, existing, just_alerted))
    }

    fn save(&self, monitors: &[Monitor]) -> Result<(), StoreError> {
        let records: Vec<MonitorRecord> = monitors.iter().map(Monitor::dump).collect();
        self.store.save_all(&records)
    }

    /// Wait for every in-flight dispatch to finish.
    pub async fn flush(&mut self) {
        while let Some(result) = self.dispatches.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "dispatch task panicked");
            }
        }
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.dispatches.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "dispatch task panicked");
            }
        }
    }

    fn spawn_dispatch(&mut self, subscriber: SubscriberKey, slug: String) {
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);
        self.dispatches.spawn(async move {
            match dispatch(source.as_ref(), notifier.as_ref(), &subscriber, &slug).await {
                Ok(()) => info!(slug = %slug, subscriber = %subscriber, notifier = notifier.name(), "launch alert sent"),
                Err(e) => warn!(slug = %slug, subscriber = %subscriber, error = %e, "launch alert failed"),
            }
        });
    }
}

async fn dispatch(
    source: &dyn EventSource,
    notifier: &dyn Notifier,
    subscriber: &SubscriberKey,
    slug: &str,
) -> Result<(), DispatchError> {
    let launch = source
        .fetch_by_slug(slug)
        .await?
        .ok_or_else(|| DispatchError::LaunchNotFound(slug.to_string()))?;
    notifier.send_alert(subscriber, &launch).await
}
