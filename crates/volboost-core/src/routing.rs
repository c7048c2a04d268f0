//! The platform audio-routing facility.

use std::sync::Arc;

use crate::error::RoutingError;
use crate::media::MediaElementHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
    Closed,
}

pub trait AudioFacility: Send + Sync {
    /// Creates a routing context. Platforms cap how many may be live per document.
    fn create_context(&self) -> Result<Arc<dyn AudioContext>, RoutingError>;
}

pub trait AudioContext: Send + Sync {
    fn state(&self) -> ContextState;

    /// Requests a transition out of `Suspended`. Completion is not reported;
    /// gain changes made meanwhile take effect once the context runs.
    fn resume(&self) -> Result<(), RoutingError>;

    /// Context clock in seconds.
    fn current_time(&self) -> f64;

    fn destination(&self) -> NodeId;

    fn create_media_element_source(
        &self,
        element: &MediaElementHandle,
    ) -> Result<Box<dyn AudioNode>, RoutingError>;

    fn create_gain(&self) -> Result<Box<dyn GainNode>, RoutingError>;

    fn connect(&self, from: NodeId, to: NodeId) -> Result<(), RoutingError>;
}

pub trait AudioNode: Send {
    fn node_id(&self) -> NodeId;
}

pub trait GainNode: AudioNode {
    fn value(&self) -> f32;

    fn set_value(&mut self, value: f32);

    /// Exponential approach towards `target` starting at `start_time`.
    fn set_target_at_time(
        &mut self,
        _target: f32,
        _start_time: f64,
        _time_constant: f64,
    ) -> Result<(), RoutingError> {
        Err(RoutingError::Unsupported("set_target_at_time"))
    }
}
