//! In-memory implementations of every platform seam, for tests and the
//! simulator. State is inspectable so callers can assert on gain values,
//! construction attempts, storage writes and companion traffic.

mod audio;
mod companion;
mod document;
mod platform;
mod storage;

pub use audio::HeadlessAudioFacility;
pub use companion::RecordingCompanion;
pub use document::{HeadlessDocument, HeadlessMediaElement, HeadlessNode};
pub use platform::HeadlessPlatform;
pub use storage::MemoryStorage;
