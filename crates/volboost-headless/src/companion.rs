use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use volboost_core::RelayError;
use volboost_core::companion::CompanionChannel;

/// Companion channel that records every delivered message.
#[derive(Debug)]
pub struct RecordingCompanion {
    connected: AtomicBool,
    sent: Mutex<Vec<Value>>,
}

impl Default for RecordingCompanion {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCompanion {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Later sends fail with [`RelayError::NoListener`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().clone()
    }

    /// `soundVolume` of every delivered change notice.
    pub fn sound_volumes(&self) -> Vec<u16> {
        self.sent
            .lock()
            .iter()
            .filter_map(|message| message.pointer("/data/soundVolume")?.as_u64())
            .filter_map(|volume| u16::try_from(volume).ok())
            .collect()
    }
}

impl CompanionChannel for RecordingCompanion {
    fn send(&self, message: Value) -> Result<(), RelayError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(RelayError::NoListener);
        }
        self.sent.lock().push(message);
        Ok(())
    }
}
