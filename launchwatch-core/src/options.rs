//! Per-subscriber options.
//!
//! Each option is described by an [`OptionSpec`] (name, default, help text).
//! [`SubscriberConfig::set`] validates a new value in memory; nothing is
//! written until the caller hands the config to [`ConfigStore::save`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::warn;

use crate::error::{ConfigError, OffsetError, StoreError};
use crate::kv::KeyValueStore;
use crate::offsets::{AlertOffsets, DEFAULT_ALERT_TIMES, parse_offset_list};
use crate::ports::ConfigResolver;
use crate::subscriber::{CHANNEL_KEY_PREFIX, SubscriberKey, USER_KEY_PREFIX};

pub const RECEIVE_ALERTS: &str = "receive_alerts";
pub const ALERT_TIMES: &str = "alert_times";
pub const TIMEZONE: &str = "timezone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub help: &'static str,
}

const CHANNEL_OPTIONS: [OptionSpec; 3] = [
    OptionSpec {
        name: RECEIVE_ALERTS,
        default: "false",
        help: "Receive alerts for upcoming launches in this channel",
    },
    OptionSpec {
        name: ALERT_TIMES,
        default: DEFAULT_ALERT_TIMES,
        help: "Comma separated list of time to launch for alerts",
    },
    OptionSpec {
        name: TIMEZONE,
        default: "UTC",
        help: "Timezone for messages in this channel",
    },
];

const USER_OPTIONS: [OptionSpec; 3] = [
    OptionSpec {
        name: RECEIVE_ALERTS,
        default: "false",
        help: "Receive alerts for upcoming launches",
    },
    OptionSpec {
        name: ALERT_TIMES,
        default: DEFAULT_ALERT_TIMES,
        help: "Comma separated list of time to launch for alerts",
    },
    OptionSpec {
        name: TIMEZONE,
        default: "UTC",
        help: "Timezone for messages",
    },
];

pub fn option_specs(subscriber: &SubscriberKey) -> &'static [OptionSpec] {
    match subscriber {
        SubscriberKey::Channel { .. } => &CHANNEL_OPTIONS,
        SubscriberKey::User { .. } => &USER_OPTIONS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    subscriber: SubscriberKey,
    /// Only values that differ from their default.
    overrides: BTreeMap<String, String>,
}

impl SubscriberConfig {
    pub fn new(subscriber: SubscriberKey) -> Self {
        Self {
            subscriber,
            overrides: BTreeMap::new(),
        }
    }

    pub fn subscriber(&self) -> &SubscriberKey {
        &self.subscriber
    }

    fn spec(&self, name: &str) -> Result<&'static OptionSpec, ConfigError> {
        let name = name.trim().to_lowercase();
        option_specs(&self.subscriber)
            .iter()
            .find(|spec| spec.name == name)
            .ok_or(ConfigError::UnknownOption(name))
    }

    pub fn get(&self, name: &str) -> Result<&str, ConfigError> {
        let spec = self.spec(name)?;
        Ok(self
            .overrides
            .get(spec.name)
            .map(String::as_str)
            .unwrap_or(spec.default))
    }

    /// Validate and apply a new value. Call [`ConfigStore::save`] to persist it.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let spec = self.spec(name)?;
        let value = normalize(spec, value)?;
        if value == spec.default {
            self.overrides.remove(spec.name);
        } else {
            self.overrides.insert(spec.name.to_string(), value);
        }
        Ok(())
    }

    /// Every option with its current value, in declaration order.
    pub fn options(&self) -> impl Iterator<Item = (&'static OptionSpec, &str)> + '_ {
        option_specs(&self.subscriber).iter().map(|spec| {
            let current = self
                .overrides
                .get(spec.name)
                .map(String::as_str)
                .unwrap_or(spec.default);
            (spec, current)
        })
    }

    pub fn receive_alerts(&self) -> bool {
        self.get(RECEIVE_ALERTS).map(|v| v == "true").unwrap_or(false)
    }

    pub fn alert_times(&self) -> &str {
        self.get(ALERT_TIMES).unwrap_or(DEFAULT_ALERT_TIMES)
    }

    pub fn alert_offsets(&self) -> Result<AlertOffsets, OffsetError> {
        parse_offset_list(self.alert_times())
    }

    /// Display timezone; unknown stored names fall back to UTC.
    pub fn timezone(&self) -> Tz {
        self.get(TIMEZONE)
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or(Tz::UTC)
    }
}

fn normalize(spec: &OptionSpec, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    match spec.name {
        RECEIVE_ALERTS => match value.to_lowercase().as_str() {
            v @ ("true" | "false") => Ok(v.to_string()),
            _ => Err(ConfigError::InvalidValue {
                option: spec.name.to_string(),
                value: value.to_string(),
                reason: "expected true or false".to_string(),
            }),
        },
        ALERT_TIMES => {
            parse_offset_list(value)?;
            Ok(value.to_string())
        }
        TIMEZONE => value
            .parse::<Tz>()
            .map(|tz| tz.name().to_string())
            .map_err(|_| ConfigError::UnknownTimezone(value.to_string())),
        _ => Ok(value.to_string()),
    }
}

/// Subscriber configs stored one JSON object per subscriber key.
#[derive(Clone)]
pub struct ConfigStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ConfigStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn load(&self, subscriber: &SubscriberKey) -> Result<SubscriberConfig, ConfigError> {
        let mut config = SubscriberConfig::new(subscriber.clone());
        let Some(json) = self.kv.get(&subscriber.db_key())? else {
            return Ok(config);
        };

        let stored: BTreeMap<String, String> =
            serde_json::from_str(&json).map_err(StoreError::from)?;
        for (name, value) in stored {
            if let Ok(spec) = config.spec(&name) {
                config.overrides.insert(spec.name.to_string(), value);
            }
        }
        Ok(config)
    }

    /// Persist non-default values only.
    pub fn save(&self, config: &SubscriberConfig) -> Result<(), ConfigError> {
        config
            .subscriber
            .validate()
            .map_err(ConfigError::InvalidSubscriber)?;
        let json = serde_json::to_string(&config.overrides).map_err(StoreError::from)?;
        self.kv.set(&config.subscriber.db_key(), &json)?;
        Ok(())
    }

    /// Every subscriber that has a stored config, channels first.
    pub fn subscribers(&self) -> Result<Vec<SubscriberKey>, ConfigError> {
        let mut out = Vec::new();
        for prefix in [CHANNEL_KEY_PREFIX, USER_KEY_PREFIX] {
            for key in self.kv.scan_prefix(prefix)? {
                match SubscriberKey::from_db_key(&key) {
                    Ok(subscriber) => out.push(subscriber),
                    Err(e) => warn!(key = %key, error = %e, "skipping unreadable config key"),
                }
            }
        }
        Ok(out)
    }
}

impl ConfigResolver for ConfigStore {
    fn offset_spec(&self, subscriber: &SubscriberKey) -> Result<String, ConfigError> {
        Ok(self.load(subscriber)?.alert_times().to_string())
    }

    fn is_alerting_enabled(&self, subscriber: &SubscriberKey) -> Result<bool, ConfigError> {
        Ok(self.load(subscriber)?.receive_alerts())
    }

    fn timezone(&self, subscriber: &SubscriberKey) -> Result<String, ConfigError> {
        Ok(self.load(subscriber)?.timezone().name().to_string())
    }

    fn enabled_subscribers(&self) -> Result<Vec<SubscriberKey>, ConfigError> {
        let mut enabled = Vec::new();
        for subscriber in self.subscribers()? {
            if self.is_alerting_enabled(&subscriber)? {
                enabled.push(subscriber);
            }
        }
        Ok(enabled)
    }
}
