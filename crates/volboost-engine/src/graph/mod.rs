mod manager;
mod rewrite;

use volboost_core::VolumeLevel;

pub use manager::AudioGraphManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphStatus {
    Uninitialized,
    Ready,
    /// Terminal for the element's lifetime.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioGraphEntry {
    pub status: GraphStatus,
    /// Level the gain stage was last set to; nominal for a fresh graph.
    pub gain_level: VolumeLevel,
}

impl AudioGraphEntry {
    pub(crate) fn uninitialized() -> Self {
        Self {
            status: GraphStatus::Uninitialized,
            gain_level: VolumeLevel::NOMINAL,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == GraphStatus::Ready
    }

    pub fn is_failed(&self) -> bool {
        self.status == GraphStatus::Failed
    }
}
