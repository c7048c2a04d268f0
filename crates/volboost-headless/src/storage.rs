use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use volboost_core::StorageError;
use volboost_core::storage::{SettingsStorage, StorageFuture};

#[derive(Debug, Default)]
struct StorageState {
    values: HashMap<String, Value>,
    writes: Vec<(String, Value)>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Settings storage backed by a map, with switchable failures.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<StorageState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: Value) -> Self {
        let storage = Self::new();
        storage.state.lock().values.insert(key.to_string(), value);
        storage
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> Vec<(String, Value)> {
        self.state.lock().writes.clone()
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.state.lock().values.get(key).cloned()
    }
}

impl SettingsStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageFuture<'_, Option<Value>> {
        let result = {
            let state = self.state.lock();
            if state.fail_reads {
                Err(StorageError::Unavailable("reads disabled".to_string()))
            } else {
                Ok(state.values.get(key).cloned())
            }
        };
        Box::pin(async move { result })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(StorageError::Denied);
        }
        state.values.insert(key.to_string(), value.clone());
        state.writes.push((key.to_string(), value));
        Ok(())
    }
}
