use std::fmt;
use std::sync::Arc;

use crate::error::PlatformError;

/// Stable identity of a media element for the lifetime of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaElementId(pub u64);

impl fmt::Display for MediaElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "media#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// A playable element owned by the document.
pub trait MediaElement: Send + Sync {
    fn id(&self) -> MediaElementId;

    fn kind(&self) -> MediaKind;

    /// Resolved source URL, `None` while the element has no source yet.
    fn current_src(&self) -> Option<String>;

    fn is_paused(&self) -> bool;

    fn cross_origin(&self) -> Option<String>;

    fn set_cross_origin(&self, value: &str) -> Result<(), PlatformError>;

    fn set_src(&self, src: &str) -> Result<(), PlatformError>;

    fn play(&self) -> Result<(), PlatformError>;
}

pub type MediaElementHandle = Arc<dyn MediaElement>;

/// A node added to or removed from the document.
pub trait DocumentNode: Send + Sync {
    /// The node itself when it is a playable element.
    fn as_media(&self) -> Option<MediaElementHandle>;

    /// Playable elements anywhere below this node, in document order.
    fn media_descendants(&self) -> Vec<MediaElementHandle>;
}

pub enum DocumentEvent {
    NodesAdded(Vec<Arc<dyn DocumentNode>>),
    NodesRemoved(Vec<Arc<dyn DocumentNode>>),
    /// Fired at most once per registration made with [`MediaDocument::once_playing`].
    MediaPlaying(MediaElementId),
}

impl fmt::Debug for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodesAdded(nodes) => f.debug_tuple("NodesAdded").field(&nodes.len()).finish(),
            Self::NodesRemoved(nodes) => {
                f.debug_tuple("NodesRemoved").field(&nodes.len()).finish()
            },
            Self::MediaPlaying(id) => f.debug_tuple("MediaPlaying").field(id).finish(),
        }
    }
}

pub type DocumentEventSink = Arc<dyn Fn(DocumentEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

pub trait MediaDocument: Send + Sync {
    /// URL of the document itself, used as the base for relative sources.
    fn url(&self) -> Option<String>;

    /// Every playable element currently attached to the document.
    fn media_elements(&self) -> Vec<MediaElementHandle>;

    fn observe_mutations(&self, sink: DocumentEventSink) -> Result<ObserverId, PlatformError>;

    fn disconnect(&self, observer: ObserverId);

    /// Registers a one-shot listener that emits [`DocumentEvent::MediaPlaying`]
    /// the next time `element` starts playing.
    fn once_playing(
        &self,
        element: &dyn MediaElement,
        sink: DocumentEventSink,
    ) -> Result<(), PlatformError>;
}
