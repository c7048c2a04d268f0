use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use url::Url;
use volboost_core::routing::{AudioContext, AudioFacility, AudioNode, ContextState, GainNode, NodeId};
use volboost_core::{MediaElementHandle, MediaElementId, RoutingError};

const DEFAULT_MAX_CONTEXTS: usize = 6;
const DESTINATION: NodeId = NodeId(0);

#[derive(Debug, Default)]
struct GainRecord {
    value: f32,
    mutations: usize,
    scheduled: usize,
}

#[derive(Debug)]
struct FacilityState {
    max_contexts: usize,
    start_suspended: bool,
    scheduling: bool,
    rejected_hosts: Vec<String>,
    context_requests: usize,
    contexts: Vec<ContextState>,
    next_node: u64,
    source_attempts: HashMap<MediaElementId, usize>,
    /// Source node to the element it was created for.
    sources: HashMap<NodeId, MediaElementId>,
    gains: HashMap<NodeId, GainRecord>,
    gain_owner: HashMap<NodeId, MediaElementId>,
    routed: HashSet<NodeId>,
}

impl FacilityState {
    fn allocate_node(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    fn gain_of(&self, element: MediaElementId) -> Option<(&NodeId, &GainRecord)> {
        self.gain_owner
            .iter()
            .find(|(_, owner)| **owner == element)
            .and_then(|(node, _)| self.gains.get_key_value(node))
    }

    fn rejects(&self, src: Option<&str>) -> bool {
        let Some(host) = src
            .and_then(|src| Url::parse(src).ok())
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.rejected_hosts
            .iter()
            .any(|rejected| host == *rejected || host.ends_with(&format!(".{rejected}")))
    }
}

/// Simulated audio-routing facility.
///
/// Contexts share one bookkeeping table, so gain values and connections can
/// be inspected per media element after the engine has built its graphs.
#[derive(Clone)]
pub struct HeadlessAudioFacility {
    state: Arc<Mutex<FacilityState>>,
}

impl Default for HeadlessAudioFacility {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessAudioFacility {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FacilityState {
                max_contexts: DEFAULT_MAX_CONTEXTS,
                start_suspended: false,
                scheduling: false,
                rejected_hosts: Vec::new(),
                context_requests: 0,
                contexts: Vec::new(),
                next_node: 0,
                source_attempts: HashMap::new(),
                sources: HashMap::new(),
                gains: HashMap::new(),
                gain_owner: HashMap::new(),
                routed: HashSet::new(),
            })),
        }
    }

    /// Refuses to wrap elements whose source is served from `host` or a subdomain of it.
    pub fn reject_sources_from(self, host: &str) -> Self {
        self.state
            .lock()
            .rejected_hosts
            .push(host.to_ascii_lowercase());
        self
    }

    pub fn with_max_contexts(self, max: usize) -> Self {
        self.state.lock().max_contexts = max;
        self
    }

    /// New contexts start suspended, as under an autoplay policy.
    pub fn starting_suspended(self) -> Self {
        self.state.lock().start_suspended = true;
        self
    }

    /// Gain nodes accept scheduled transitions.
    pub fn with_scheduling(self) -> Self {
        self.state.lock().scheduling = true;
        self
    }

    pub fn contexts_created(&self) -> usize {
        self.state.lock().contexts.len()
    }

    pub fn context_requests(&self) -> usize {
        self.state.lock().context_requests
    }

    pub fn source_attempts(&self, element: MediaElementId) -> usize {
        self.state
            .lock()
            .source_attempts
            .get(&element)
            .copied()
            .unwrap_or(0)
    }

    /// Gain applied to `element`, once a gain node has been connected after its source.
    pub fn gain_value(&self, element: MediaElementId) -> Option<f32> {
        self.state
            .lock()
            .gain_of(element)
            .map(|(_, record)| record.value)
    }

    pub fn gain_mutations(&self, element: MediaElementId) -> usize {
        self.state
            .lock()
            .gain_of(element)
            .map_or(0, |(_, record)| record.mutations)
    }

    pub fn scheduled_changes(&self, element: MediaElementId) -> usize {
        self.state
            .lock()
            .gain_of(element)
            .map_or(0, |(_, record)| record.scheduled)
    }

    pub fn is_routed_to_destination(&self, element: MediaElementId) -> bool {
        let state = self.state.lock();
        state
            .gain_of(element)
            .is_some_and(|(node, _)| state.routed.contains(node))
    }
}

impl AudioFacility for HeadlessAudioFacility {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>, RoutingError> {
        let mut state = self.state.lock();
        state.context_requests += 1;
        if state.contexts.len() >= state.max_contexts {
            return Err(RoutingError::ContextLimit {
                limit: state.max_contexts,
            });
        }
        let initial = if state.start_suspended {
            ContextState::Suspended
        } else {
            ContextState::Running
        };
        let index = state.contexts.len();
        state.contexts.push(initial);
        debug!(index, ?initial, "headless audio context created");
        Ok(Arc::new(HeadlessAudioContext {
            index,
            state: Arc::clone(&self.state),
        }))
    }
}

struct HeadlessAudioContext {
    index: usize,
    state: Arc<Mutex<FacilityState>>,
}

impl AudioContext for HeadlessAudioContext {
    fn state(&self) -> ContextState {
        self.state.lock().contexts[self.index]
    }

    fn resume(&self) -> Result<(), RoutingError> {
        let mut state = self.state.lock();
        if state.contexts[self.index] == ContextState::Closed {
            return Err(RoutingError::ContextClosed);
        }
        state.contexts[self.index] = ContextState::Running;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_media_element_source(
        &self,
        element: &MediaElementHandle,
    ) -> Result<Box<dyn AudioNode>, RoutingError> {
        let mut state = self.state.lock();
        let id = element.id();
        *state.source_attempts.entry(id).or_insert(0) += 1;
        if state.sources.values().any(|owner| *owner == id) {
            return Err(RoutingError::AlreadyBound);
        }
        let src = element.current_src();
        if state.rejects(src.as_deref()) {
            return Err(RoutingError::SourceRejected(src.unwrap_or_default()));
        }
        let node = state.allocate_node();
        state.sources.insert(node, id);
        Ok(Box::new(HeadlessSourceNode { node }))
    }

    fn create_gain(&self) -> Result<Box<dyn GainNode>, RoutingError> {
        let mut state = self.state.lock();
        let node = state.allocate_node();
        state.gains.insert(
            node,
            GainRecord {
                value: 1.0,
                ..GainRecord::default()
            },
        );
        Ok(Box::new(HeadlessGainNode {
            node,
            value: 1.0,
            scheduling: state.scheduling,
            state: Arc::clone(&self.state),
        }))
    }

    fn connect(&self, from: NodeId, to: NodeId) -> Result<(), RoutingError> {
        let mut state = self.state.lock();
        if let Some(owner) = state.sources.get(&from).copied() {
            if !state.gains.contains_key(&to) {
                return Err(RoutingError::Connect(format!("{to:?} is not a gain node")));
            }
            state.gain_owner.insert(to, owner);
            return Ok(());
        }
        if state.gains.contains_key(&from) && to == DESTINATION {
            state.routed.insert(from);
            return Ok(());
        }
        Err(RoutingError::Connect(format!("{from:?} -> {to:?}")))
    }
}

struct HeadlessSourceNode {
    node: NodeId,
}

impl AudioNode for HeadlessSourceNode {
    fn node_id(&self) -> NodeId {
        self.node
    }
}

struct HeadlessGainNode {
    node: NodeId,
    value: f32,
    scheduling: bool,
    state: Arc<Mutex<FacilityState>>,
}

impl HeadlessGainNode {
    fn record(&self, scheduled: bool) {
        let mut state = self.state.lock();
        if let Some(record) = state.gains.get_mut(&self.node) {
            record.value = self.value;
            record.mutations += 1;
            if scheduled {
                record.scheduled += 1;
            }
        }
    }
}

impl AudioNode for HeadlessGainNode {
    fn node_id(&self) -> NodeId {
        self.node
    }
}

impl GainNode for HeadlessGainNode {
    fn value(&self) -> f32 {
        self.value
    }

    fn set_value(&mut self, value: f32) {
        self.value = value;
        self.record(false);
    }

    // Settles immediately; the headless clock never advances.
    fn set_target_at_time(
        &mut self,
        target: f32,
        _start_time: f64,
        _time_constant: f64,
    ) -> Result<(), RoutingError> {
        if !self.scheduling {
            return Err(RoutingError::Unsupported("set_target_at_time"));
        }
        self.value = target;
        self.record(true);
        Ok(())
    }
}
