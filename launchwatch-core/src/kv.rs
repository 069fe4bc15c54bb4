//! Key-value substrate and the monitor store built on it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::monitor::MonitorRecord;
use crate::ports::MonitorStore;

/// Key holding the whole monitor collection as one JSON array.
pub const MONITORS_KEY: &str = "launch-monitors";

/// Minimal get/set/scan storage. Handles are shared as `Arc<dyn KeyValueStore>`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Keys starting with `prefix`, in ascending order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// Monitor collection stored under [`MONITORS_KEY`], replaced on every save.
#[derive(Clone)]
pub struct KvMonitorStore {
    kv: Arc<dyn KeyValueStore>,
}

impl KvMonitorStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

impl MonitorStore for KvMonitorStore {
    fn load_all(&self) -> Result<Vec<MonitorRecord>, StoreError> {
        match self.kv.get(MONITORS_KEY)? {
            Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(Vec::new()),
        }
    }

    fn save_all(&self, records: &[MonitorRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        self.kv.set(MONITORS_KEY, &json)
    }
}
