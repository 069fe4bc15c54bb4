//! Collaborator interfaces the scheduler is driven through.
//!
//! Concrete adapters (HTTP launch feed, chat/webhook delivery, file storage)
//! live outside this crate; tests use in-memory fakes.

use async_trait::async_trait;

use crate::error::{ConfigError, DispatchError, SourceError, StoreError};
use crate::launch::LaunchRecord;
use crate::monitor::MonitorRecord;
use crate::offsets::{AlertOffsets, parse_offset_list};
use crate::subscriber::SubscriberKey;

/// Upstream launch data.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// The next `count` launches, soonest first.
    async fn fetch_upcoming(&self, count: usize) -> Result<Vec<LaunchRecord>, SourceError>;

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<LaunchRecord>, SourceError>;
}

/// Delivers alerts. Resolving a subscriber into a concrete target is the notifier's job.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Resolves once the delivery channel can accept messages.
    async fn wait_until_ready(&self) {}

    async fn send_alert(
        &self,
        subscriber: &SubscriberKey,
        launch: &LaunchRecord,
    ) -> Result<(), DispatchError>;

    /// Human-readable channel name for logs.
    fn name(&self) -> &str;
}

/// Per-subscriber settings as the scheduler needs them.
pub trait ConfigResolver: Send + Sync {
    fn offset_spec(&self, subscriber: &SubscriberKey) -> Result<String, ConfigError>;

    fn is_alerting_enabled(&self, subscriber: &SubscriberKey) -> Result<bool, ConfigError>;

    /// Display timezone name. Not used by due-date math, which is UTC throughout.
    fn timezone(&self, subscriber: &SubscriberKey) -> Result<String, ConfigError>;

    /// Every subscriber that currently has alerts switched on.
    fn enabled_subscribers(&self) -> Result<Vec<SubscriberKey>, ConfigError>;

    fn offsets(&self, subscriber: &SubscriberKey) -> Result<AlertOffsets, ConfigError> {
        Ok(parse_offset_list(&self.offset_spec(subscriber)?)?)
    }
}

/// The persisted monitor collection, always read and written whole.
pub trait MonitorStore: Send + Sync {
    fn load_all(&self) -> Result<Vec<MonitorRecord>, StoreError>;

    fn save_all(&self, records: &[MonitorRecord]) -> Result<(), StoreError>;
}
