use std::time::Duration;

use volboost_core::{MediaElementId, VolumeLevel};

use crate::graph::AudioGraphEntry;
use crate::policy::{HostPolicy, HostPolicyConfig};
use crate::state::{SAVED_VOLUME_KEY, VolumeState};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub host_policy: HostPolicyConfig,
    pub storage_key: String,
    pub command_timeout: Duration,
    /// Window in which bursts of document activity collapse into one `apply()`.
    pub rediscovery_debounce: Duration,
    /// Time constant of the scheduled gain approach; zero sets gains immediately.
    pub gain_time_constant: Duration,
    /// Leave elements without a graph alone while the target is 100%.
    pub defer_graph_at_nominal: bool,
    pub legacy_cross_origin_rewrite: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host_policy: HostPolicyConfig::default(),
            storage_key: SAVED_VOLUME_KEY.to_string(),
            command_timeout: Duration::from_secs(5),
            rediscovery_debounce: Duration::from_millis(50),
            gain_time_constant: Duration::from_millis(15),
            defer_graph_at_nominal: true,
            legacy_cross_origin_rewrite: false,
        }
    }
}

/// Outcome of one `apply()` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    /// Watermark matched and nothing was playing.
    pub skipped: bool,
    pub persisted: bool,
    pub notified: bool,
    pub applied: usize,
    /// Elements left to the companion because of their host policy.
    pub delegated: usize,
    /// Elements without a graph while the target is nominal.
    pub deferred: usize,
    /// Elements whose graph is missing or failed.
    pub unavailable: usize,
}

impl ApplyReport {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOutcome {
    Applied,
    Delegated,
    Deferred,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    pub volume: VolumeState,
    pub page_policy: HostPolicy,
    pub audio_routing: bool,
    pub graphs: Vec<(MediaElementId, AudioGraphEntry)>,
}

impl EngineSnapshot {
    pub fn current(&self) -> VolumeLevel {
        self.volume.current
    }

    pub fn graph(&self, id: MediaElementId) -> Option<AudioGraphEntry> {
        self.graphs
            .iter()
            .find(|(element, _)| *element == id)
            .map(|(_, entry)| *entry)
    }
}
