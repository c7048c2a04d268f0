//! Platform seams and shared value types for the volume amplification engine.
//!
//! Everything the engine touches outside its own state is reached through the
//! traits in this crate: the document and its media elements, the audio-routing
//! facility, durable settings storage and the companion process channel.

pub mod companion;
pub mod error;
pub mod media;
pub mod platform;
pub mod routing;
pub mod storage;
pub mod volume;

pub use error::{PlatformError, RelayError, RoutingError, StorageError, VolumeError};
pub use media::{
    DocumentEvent, DocumentEventSink, DocumentNode, MediaDocument, MediaElement,
    MediaElementHandle, MediaElementId, MediaKind, ObserverId,
};
pub use platform::Platform;
pub use volume::VolumeLevel;
