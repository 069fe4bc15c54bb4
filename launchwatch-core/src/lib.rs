//! launchwatch-core: monitors, alert offsets and the polling alert loop.

pub mod error;
pub mod kv;
pub mod launch;
pub mod monitor;
pub mod offsets;
pub mod options;
pub mod ports;
pub mod registry;
pub mod scheduler;
pub mod subscriber;
pub mod time;

pub use error::{ConfigError, DispatchError, OffsetError, SourceError, StoreError};
pub use kv::{KeyValueStore, KvMonitorStore, MONITORS_KEY, MemoryStore};
pub use launch::LaunchRecord;
pub use monitor::{AlertSchedule, Monitor, MonitorKey, MonitorRecord};
pub use offsets::{
    AlertOffsets, DEFAULT_ALERT_TIMES, format_offset, is_valid_offset_spec, parse_offset_list,
    parse_offset_spec,
};
pub use options::{ConfigStore, OptionSpec, SubscriberConfig};
pub use ports::{ConfigResolver, EventSource, MonitorStore, Notifier};
pub use registry::{apply_alerts, describe, load_due, reconcile};
pub use scheduler::{AlertScheduler, SchedulerSettings, SchedulerState, TickReport};
pub use subscriber::SubscriberKey;
pub use time::countdown;
