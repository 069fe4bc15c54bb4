use anyhow::{Context, Result};
use launchwatch_core::SchedulerSettings;
use launchwatch_source::{DEFAULT_BASE_URL, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::{default_store_path, ensure_launchwatch_home};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub scheduler: SchedulerSection,
    pub notify: NotifySection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub base_url: String,
    /// How many upcoming launches each tick monitors.
    pub upcoming_count: usize,
    pub retry_attempts: u32,
    pub retry_initial_ms: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            upcoming_count: 5,
            retry_attempts: 4,
            retry_initial_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub interval_secs: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    /// When set, alerts are POSTed here as JSON. Otherwise they are printed.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Store document path (default: `<home>/store.json`).
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.source.retry_attempts)
            .with_initial_delay(Duration::from_millis(self.source.retry_initial_ms))
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings::default()
            .with_interval(Duration::from_secs(self.scheduler.interval_secs.max(1)))
            .with_upcoming_count(self.source.upcoming_count.max(1))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_launchwatch_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_config(
            r#"
            [source]
            upcoming_count = 10

            [notify]
            webhook_url = "https://hooks.example.com/launches"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.source.upcoming_count, 10);
        assert_eq!(cfg.source.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.scheduler.interval_secs, 60);
        assert_eq!(cfg.notify.webhook_url.as_deref(), Some("https://hooks.example.com/launches"));
    }

    #[test]
    fn settings_and_retry_policy() {
        let mut cfg = Config::default();
        cfg.scheduler.interval_secs = 0;
        cfg.source.retry_attempts = 2;
        assert_eq!(cfg.scheduler_settings().interval, Duration::from_secs(1));
        assert_eq!(cfg.scheduler_settings().upcoming_count, 5);
        assert_eq!(cfg.retry_policy().max_attempts, 2);
        assert_eq!(cfg.retry_policy().initial_delay, Duration::from_millis(500));
    }

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(parse_config(&s).unwrap(), Config::default());
    }
}
