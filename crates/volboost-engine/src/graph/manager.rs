use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};
use volboost_core::routing::{AudioContext, AudioFacility, AudioNode, ContextState, GainNode};
use volboost_core::{
    MediaElement, MediaElementHandle, MediaElementId, RoutingError, VolumeLevel,
};

use crate::graph::rewrite;
use crate::graph::{AudioGraphEntry, GraphStatus};
use crate::policy::{HostPolicy, HostPolicyRegistry};

struct GraphNodes {
    // Held so the source stays connected for as long as the entry lives.
    _source: Box<dyn AudioNode>,
    gain: Box<dyn GainNode>,
}

struct TrackedGraph {
    element: Weak<dyn MediaElement>,
    entry: AudioGraphEntry,
    nodes: Option<GraphNodes>,
}

enum ContextSlot {
    Unopened,
    Open(Arc<dyn AudioContext>),
    /// Creation failed or the platform closed it; never retried.
    Unavailable(RoutingError),
}

/// Owns the document's single routing context and one graph per element.
pub struct AudioGraphManager {
    facility: Arc<dyn AudioFacility>,
    policy: Arc<HostPolicyRegistry>,
    page_policy: HostPolicy,
    context: ContextSlot,
    graphs: HashMap<MediaElementId, TrackedGraph>,
    gain_time_constant: Duration,
    legacy_rewrite: bool,
}

impl AudioGraphManager {
    pub fn new(facility: Arc<dyn AudioFacility>, policy: Arc<HostPolicyRegistry>) -> Self {
        let page_policy = policy.page_policy();
        Self {
            facility,
            policy,
            page_policy,
            context: ContextSlot::Unopened,
            graphs: HashMap::new(),
            gain_time_constant: Duration::ZERO,
            legacy_rewrite: false,
        }
    }

    pub fn with_gain_time_constant(mut self, time_constant: Duration) -> Self {
        self.gain_time_constant = time_constant;
        self
    }

    pub fn with_legacy_rewrite(mut self, enabled: bool) -> Self {
        self.legacy_rewrite = enabled;
        self
    }

    pub fn entry(&self, id: MediaElementId) -> Option<&AudioGraphEntry> {
        self.graphs.get(&id).map(|tracked| &tracked.entry)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        match &self.context {
            ContextSlot::Open(context) => Some(context.state()),
            ContextSlot::Unopened | ContextSlot::Unavailable(_) => None,
        }
    }

    /// Returns the element's entry, building its graph on first use.
    ///
    /// Nothing is recorded while the element has no source or its host forbids
    /// graphs, so a later source change can still succeed. A construction
    /// failure is recorded as a permanent `Failed` entry and yields `None`.
    pub fn ensure_graph(&mut self, handle: &MediaElementHandle) -> Option<&AudioGraphEntry> {
        let id = handle.id();
        if self.graphs.contains_key(&id) {
            if self.is_stale(id) {
                self.graphs.remove(&id);
            } else {
                return self.graphs.get(&id).map(|tracked| &tracked.entry);
            }
        }

        let src = handle.current_src().filter(|v| !v.trim().is_empty())?;
        let policy = self.policy.element_policy(self.page_policy, Some(&src));
        if !policy.allows_graph() {
            debug!(element = %id, %src, "host forbids audio graph");
            return None;
        }

        let mut tracked = TrackedGraph {
            element: Arc::downgrade(handle),
            entry: AudioGraphEntry::uninitialized(),
            nodes: None,
        };
        let built = match self.build(handle, &src, policy) {
            Ok(nodes) => {
                let gain = nodes.gain.value();
                tracked.entry.status = GraphStatus::Ready;
                tracked.nodes = Some(nodes);
                debug!(element = %id, %src, gain, "audio graph ready");
                true
            },
            Err(err) => {
                tracked.entry.status = GraphStatus::Failed;
                warn!(element = %id, %src, error = %err, "audio graph construction failed");
                false
            },
        };
        self.graphs.insert(id, tracked);
        if built { self.entry(id) } else { None }
    }

    /// Sets the element's gain stage to `level`. Returns `false` when the
    /// element has no usable graph. Repeating a level mutates nothing.
    pub fn apply_gain(&mut self, handle: &MediaElementHandle, level: VolumeLevel) -> bool {
        match self.ensure_graph(handle) {
            Some(entry) if entry.is_ready() => {},
            _ => return false,
        }
        let id = handle.id();
        if self.entry(id).is_some_and(|entry| entry.gain_level == level) {
            return true;
        }

        let start_time = self.running_context().map(|context| context.current_time());
        let time_constant = self.gain_time_constant.as_secs_f64();
        let Some(tracked) = self.graphs.get_mut(&id) else {
            return false;
        };
        let Some(nodes) = tracked.nodes.as_mut() else {
            return false;
        };

        let target = level.gain();
        let scheduled = match start_time {
            Some(start_time) if time_constant > 0.0 => {
                match nodes.gain.set_target_at_time(target, start_time, time_constant) {
                    Ok(()) => true,
                    Err(RoutingError::Unsupported(_)) => false,
                    Err(err) => {
                        debug!(element = %id, error = %err, "scheduled gain change rejected");
                        false
                    },
                }
            },
            _ => false,
        };
        if !scheduled {
            nodes.gain.set_value(target);
        }
        let previous = tracked.entry.gain_level;
        tracked.entry.gain_level = level;
        debug!(element = %id, from = %previous, to = %level, scheduled, "gain applied");
        true
    }

    /// Returns an existing amplified graph to unity without building new ones.
    /// Used when an element's source moves to a host handled by the companion.
    pub fn release_gain(&mut self, handle: &MediaElementHandle) -> bool {
        let amplified = self
            .entry(handle.id())
            .is_some_and(|entry| entry.is_ready() && !entry.gain_level.is_nominal());
        amplified && self.apply_gain(handle, VolumeLevel::NOMINAL)
    }

    /// Drops entries whose element no longer exists. Returns how many were removed.
    pub fn prune_detached(&mut self) -> usize {
        let before = self.graphs.len();
        self.graphs
            .retain(|_, tracked| tracked.element.strong_count() > 0);
        before - self.graphs.len()
    }

    pub fn snapshot(&self) -> Vec<(MediaElementId, AudioGraphEntry)> {
        let mut entries: Vec<_> = self
            .graphs
            .iter()
            .map(|(id, tracked)| (*id, tracked.entry))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    fn is_stale(&self, id: MediaElementId) -> bool {
        self.graphs
            .get(&id)
            .is_some_and(|tracked| tracked.element.strong_count() == 0)
    }

    fn build(
        &mut self,
        handle: &MediaElementHandle,
        src: &str,
        policy: HostPolicy,
    ) -> Result<GraphNodes, RoutingError> {
        let context = self.shared_context()?;
        if self.legacy_rewrite && policy.allows_source_rewrite() {
            if let Err(err) =
                rewrite::prepare_cross_origin(handle, src, self.policy.document_url())
            {
                debug!(element = %handle.id(), error = %err, "cross-origin rewrite failed");
            }
        }
        let source = context.create_media_element_source(handle)?;
        let gain = context.create_gain()?;
        context.connect(source.node_id(), gain.node_id())?;
        context.connect(gain.node_id(), context.destination())?;
        Ok(GraphNodes {
            _source: source,
            gain,
        })
    }

    fn shared_context(&mut self) -> Result<Arc<dyn AudioContext>, RoutingError> {
        let context = match &self.context {
            ContextSlot::Open(context) => Arc::clone(context),
            ContextSlot::Unavailable(err) => return Err(err.clone()),
            ContextSlot::Unopened => match self.facility.create_context() {
                Ok(context) => {
                    info!("shared audio context created");
                    self.context = ContextSlot::Open(Arc::clone(&context));
                    context
                },
                Err(err) => {
                    warn!(error = %err, "shared audio context unavailable");
                    self.context = ContextSlot::Unavailable(err.clone());
                    return Err(err);
                },
            },
        };
        match context.state() {
            ContextState::Running => {},
            ContextState::Suspended => {
                if let Err(err) = context.resume() {
                    debug!(error = %err, "audio context resume request failed");
                }
            },
            ContextState::Closed => {
                self.context = ContextSlot::Unavailable(RoutingError::ContextClosed);
                return Err(RoutingError::ContextClosed);
            },
        }
        Ok(context)
    }

    fn running_context(&mut self) -> Option<Arc<dyn AudioContext>> {
        match &self.context {
            ContextSlot::Open(_) => self.shared_context().ok(),
            ContextSlot::Unopened | ContextSlot::Unavailable(_) => None,
        }
    }
}
