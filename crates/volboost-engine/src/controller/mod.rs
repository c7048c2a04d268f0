//! Orchestrates one document context: validates requests, persists, keeps the
//! companion informed and drives per-element gain.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use volboost_core::{
    DocumentEvent, DocumentEventSink, MediaElementHandle, MediaElementId, Platform, VolumeError,
    VolumeLevel,
};

use crate::discovery::{MediaDiscovery, Subscription};
use crate::graph::AudioGraphManager;
use crate::policy::{HostPolicy, HostPolicyRegistry};
use crate::relay::{CompanionRequest, SyncRelay, volume_reply};
use crate::state::{VolumeState, VolumeStore};
use crate::types::{ApplyReport, ElementOutcome, EngineConfig, EngineSnapshot};

pub struct AmplificationController {
    volume: VolumeStore,
    relay: SyncRelay,
    discovery: MediaDiscovery,
    /// `None` when this context has no audio-routing facility.
    graphs: Option<AudioGraphManager>,
    policy: Arc<HostPolicyRegistry>,
    page_policy: HostPolicy,
    defer_graph_at_nominal: bool,
}

impl AmplificationController {
    pub fn new(platform: &Platform, config: &EngineConfig, volume: VolumeStore) -> Self {
        let document_url = platform.document.url();
        let policy = Arc::new(
            HostPolicyRegistry::new(&config.host_policy).with_document_url(document_url.as_deref()),
        );
        let graphs = platform.audio.as_ref().map(|facility| {
            AudioGraphManager::new(Arc::clone(facility), Arc::clone(&policy))
                .with_gain_time_constant(config.gain_time_constant)
                .with_legacy_rewrite(config.legacy_cross_origin_rewrite)
        });
        Self {
            volume,
            relay: SyncRelay::new(Arc::clone(&platform.companion)),
            discovery: MediaDiscovery::new(Arc::clone(&platform.document)),
            graphs,
            page_policy: policy.page_policy(),
            policy,
            defer_graph_at_nominal: config.defer_graph_at_nominal,
        }
    }

    /// Subscribes to the document, registers the elements already present and
    /// applies the restored level. Observation failures leave the engine
    /// working on the initial scan only.
    pub fn start(&mut self, sink: DocumentEventSink) -> Option<Subscription> {
        let subscription = match self.discovery.observe_new_elements(sink) {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!(error = %err, "document observation unavailable");
                None
            },
        };
        let existing = self.discovery.scan_existing();
        for element in &existing {
            self.discovery.mark_discovered(element);
        }
        // An idle document starts in sync with the restored level; the first
        // pass only has work to do when something is already playing.
        if !existing.iter().any(|element| !element.is_paused()) {
            self.volume.mark_applied(self.volume.current());
        }
        let report = self.apply();
        info!(
            volume = %self.volume.current(),
            page_policy = ?self.page_policy,
            audio_routing = self.graphs.is_some(),
            elements = existing.len(),
            applied = report.applied,
            "amplification engine started"
        );
        subscription
    }

    pub fn volume_state(&self) -> VolumeState {
        self.volume.state()
    }

    pub fn current_volume(&self) -> VolumeLevel {
        self.volume.current()
    }

    pub fn page_policy(&self) -> HostPolicy {
        self.page_policy
    }

    pub fn request_volume(&mut self, level: VolumeLevel) -> ApplyReport {
        self.volume.set_current(level);
        self.apply()
    }

    /// Validates an untrusted value; rejected values change nothing.
    pub fn request_volume_raw(&mut self, raw: &Value) -> Result<ApplyReport, VolumeError> {
        self.volume.set_current_raw(raw)?;
        Ok(self.apply())
    }

    /// Brings the document in line with the current target.
    ///
    /// A pass whose target equals the watermark while nothing plays is a no-op.
    /// With media playing, an unchanged target only refreshes element gains;
    /// persistence and the companion are touched only when the target moved.
    pub fn apply(&mut self) -> ApplyReport {
        let target = self.volume.current();
        let changed = self.volume.last_applied() != Some(target);
        let elements = self.discovery.scan_existing();
        if !changed && !elements.iter().any(|element| !element.is_paused()) {
            return ApplyReport::skipped();
        }

        let mut report = ApplyReport::default();
        if changed {
            self.volume.mark_applied(target);
            report.persisted = self.volume.save(target);
            report.notified = self.relay.notify(target);
        }
        if self.graphs.is_none() {
            debug!(volume = %target, "no local audio routing; companion handles amplification");
            return report;
        }

        for element in &elements {
            match self.apply_to(element, target) {
                ElementOutcome::Applied => report.applied += 1,
                ElementOutcome::Delegated => report.delegated += 1,
                ElementOutcome::Deferred => report.deferred += 1,
                ElementOutcome::Unavailable => report.unavailable += 1,
            }
        }
        debug!(volume = %target, ?report, "volume applied");
        report
    }

    pub fn on_element_found(&mut self, element: &MediaElementHandle) -> ElementOutcome {
        self.apply_to(element, self.volume.current())
    }

    pub fn on_element_playing(&mut self, id: MediaElementId) -> Option<ElementOutcome> {
        let element = self.discovery.find(id)?;
        Some(self.apply_to(&element, self.volume.current()))
    }

    /// Handles one document notification. Returns whether a follow-up
    /// `apply()` pass is worthwhile.
    pub fn on_document_event(&mut self, event: DocumentEvent) -> bool {
        match event {
            DocumentEvent::NodesAdded(nodes) => {
                let found = self.discovery.accept_added(&nodes);
                for element in &found {
                    let outcome = self.on_element_found(element);
                    debug!(element = %element.id(), ?outcome, "new media element handled");
                }
                !found.is_empty()
            },
            DocumentEvent::NodesRemoved(nodes) => {
                let removed = self.discovery.accept_removed(&nodes);
                // The event keeps the removed subtrees alive until it is dropped.
                drop(nodes);
                if let Some(graphs) = self.graphs.as_mut() {
                    let pruned = graphs.prune_detached();
                    debug!(removed = removed.len(), pruned, "media elements removed");
                }
                false
            },
            DocumentEvent::MediaPlaying(id) => {
                let outcome = self.on_element_playing(id);
                debug!(element = %id, ?outcome, "media element became active");
                true
            },
        }
    }

    /// Answers a companion request. Unrecognized messages get no reply.
    pub fn handle_companion_message(&mut self, message: &Value) -> Option<Value> {
        let Some(request) = CompanionRequest::parse(message) else {
            debug!("ignoring unrecognized companion message");
            return None;
        };
        match request {
            CompanionRequest::ChangeSoundVolume { requested } => {
                if let Err(err) = self.request_volume_raw(&requested) {
                    debug!(error = %err, "rejected companion volume request");
                }
            },
            CompanionRequest::GetSoundVolume => {},
        }
        Some(volume_reply(self.volume.current()))
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            volume: self.volume.state(),
            page_policy: self.page_policy,
            audio_routing: self.graphs.is_some(),
            graphs: self
                .graphs
                .as_ref()
                .map(AudioGraphManager::snapshot)
                .unwrap_or_default(),
        }
    }

    fn apply_to(&mut self, element: &MediaElementHandle, target: VolumeLevel) -> ElementOutcome {
        let src = element.current_src();
        let policy = self.policy.element_policy(self.page_policy, src.as_deref());
        if policy != HostPolicy::Normal {
            if let Some(graphs) = self.graphs.as_mut() {
                if graphs.release_gain(element) {
                    debug!(
                        element = %element.id(),
                        ?policy,
                        "gain returned to unity for delegated element"
                    );
                }
            }
            return ElementOutcome::Delegated;
        }
        let Some(graphs) = self.graphs.as_mut() else {
            return ElementOutcome::Unavailable;
        };
        if self.defer_graph_at_nominal && target.is_nominal() && graphs.entry(element.id()).is_none()
        {
            return ElementOutcome::Deferred;
        }
        if graphs.apply_gain(element, target) {
            ElementOutcome::Applied
        } else {
            ElementOutcome::Unavailable
        }
    }
}

#[cfg(test)]
mod tests;
