//! Key-value persistence for committed calibrations
//!
//! The engine only depends on the [`KeyValueStore`] trait; hosts plug in
//! their own preferences storage. Two stores ship with the crate: an
//! in-memory map for tests and a JSON file for command-line use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Result};

/// Scalar values the calibration record is made of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Float(f64),
    Text(String),
}

impl StoredValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StoredValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// External key-value collaborator. Failures are reported, never retried.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<StoredValue>>;
    fn set(&self, key: &str, value: StoredValue) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Write `entries` in order, later entries overwriting earlier ones.
    ///
    /// The default issues one `set` per entry and can stop partway; stores
    /// able to commit several keys at once should override it.
    fn set_many(&self, entries: &[(&str, StoredValue)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value.clone())?;
        }
        Ok(())
    }
}

fn poisoned() -> AnalysisError {
    AnalysisError::Persistence {
        message: "store lock poisoned".to_string(),
        source: None,
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, StoredValue)]) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        for (key, value) in entries {
            values.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// Every write rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, StoredValue>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AnalysisError::persistence(format!("Failed to read store: {}", self.path.display()), e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AnalysisError::persistence(format!("Corrupt store: {}", self.path.display()), e)
        })
    }

    fn save(&self, values: &BTreeMap<String, StoredValue>) -> Result<()> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| AnalysisError::persistence("Failed to serialize store", e))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| {
            AnalysisError::persistence(format!("Failed to write store: {}", tmp.display()), e)
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            AnalysisError::persistence(format!("Failed to replace store: {}", self.path.display()), e)
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut values = self.load()?;
        values.insert(key.to_string(), value);
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }

    /// All entries land in a single file replacement
    fn set_many(&self, entries: &[(&str, StoredValue)]) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut values = self.load()?;
        for (key, value) in entries {
            values.insert(key.to_string(), value.clone());
        }
        self.save(&values)
    }
}
