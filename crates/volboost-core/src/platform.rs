use std::sync::Arc;

use crate::companion::CompanionChannel;
use crate::media::MediaDocument;
use crate::routing::AudioFacility;
use crate::storage::SettingsStorage;

/// Collaborators available to one document context.
#[derive(Clone)]
pub struct Platform {
    pub document: Arc<dyn MediaDocument>,
    /// `None` when this context routes amplification only through the companion.
    pub audio: Option<Arc<dyn AudioFacility>>,
    pub storage: Arc<dyn SettingsStorage>,
    pub companion: Arc<dyn CompanionChannel>,
}

impl Platform {
    pub fn has_audio_routing(&self) -> bool {
        self.audio.is_some()
    }
}
