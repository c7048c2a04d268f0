use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};
use volboost_core::storage::SettingsStorage;
use volboost_core::{VolumeError, VolumeLevel};

pub const SAVED_VOLUME_KEY: &str = "savedVolume";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeState {
    /// Authoritative target.
    pub current: VolumeLevel,
    /// Last fully applied target; `None` until the first `apply()`.
    pub last_applied: Option<VolumeLevel>,
    /// Mirror of the durably stored value.
    pub persisted: VolumeLevel,
}

impl VolumeState {
    pub fn restored(persisted: VolumeLevel) -> Self {
        Self {
            current: persisted,
            last_applied: None,
            persisted,
        }
    }
}

pub struct VolumeStore {
    storage: Arc<dyn SettingsStorage>,
    key: String,
    state: VolumeState,
}

impl VolumeStore {
    /// Restores the saved volume. Missing, corrupt or unreadable values fall
    /// back to 100% without surfacing an error.
    pub async fn load(storage: Arc<dyn SettingsStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let persisted = match storage.get(&key).await {
            Ok(Some(value)) => VolumeLevel::from_json(&value).unwrap_or_else(|err| {
                warn!(%key, error = %err, "stored volume is invalid; using default");
                VolumeLevel::NOMINAL
            }),
            Ok(None) => VolumeLevel::NOMINAL,
            Err(err) => {
                warn!(%key, error = %err, "volume storage unavailable; using default");
                VolumeLevel::NOMINAL
            },
        };
        debug!(%key, volume = %persisted, "volume restored");
        Self::with_persisted(storage, key, persisted)
    }

    pub fn with_persisted(
        storage: Arc<dyn SettingsStorage>,
        key: impl Into<String>,
        persisted: VolumeLevel,
    ) -> Self {
        Self {
            storage,
            key: key.into(),
            state: VolumeState::restored(persisted),
        }
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }

    pub fn current(&self) -> VolumeLevel {
        self.state.current
    }

    pub fn set_current(&mut self, level: VolumeLevel) {
        self.state.current = level;
    }

    /// Validates an untrusted value before touching state.
    pub fn set_current_raw(&mut self, raw: &Value) -> Result<VolumeLevel, VolumeError> {
        let level = VolumeLevel::from_json(raw)?;
        self.state.current = level;
        Ok(level)
    }

    pub fn last_applied(&self) -> Option<VolumeLevel> {
        self.state.last_applied
    }

    pub fn mark_applied(&mut self, level: VolumeLevel) {
        self.state.last_applied = Some(level);
    }

    pub fn persisted(&self) -> VolumeLevel {
        self.state.persisted
    }

    /// Writes `level` through to storage. Returns whether a write was issued;
    /// failures are logged and swallowed.
    pub fn save(&mut self, level: VolumeLevel) -> bool {
        if level == self.state.persisted {
            return false;
        }
        match self.storage.set(&self.key, json!(level.percent())) {
            Ok(()) => {
                self.state.persisted = level;
                true
            },
            Err(err) => {
                warn!(key = %self.key, volume = %level, error = %err, "failed to persist volume");
                false
            },
        }
    }
}
