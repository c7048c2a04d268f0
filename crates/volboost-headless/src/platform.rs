use std::sync::Arc;

use volboost_core::{MediaDocument, Platform};
use volboost_core::companion::CompanionChannel;
use volboost_core::routing::AudioFacility;
use volboost_core::storage::SettingsStorage;

use crate::audio::HeadlessAudioFacility;
use crate::companion::RecordingCompanion;
use crate::document::HeadlessDocument;
use crate::storage::MemoryStorage;

/// Concrete handles to every headless collaborator, kept so tests can
/// drive the document and inspect side effects after handing a
/// [`Platform`] to the engine.
pub struct HeadlessPlatform {
    pub document: Arc<HeadlessDocument>,
    pub audio: Option<Arc<HeadlessAudioFacility>>,
    pub storage: Arc<MemoryStorage>,
    pub companion: Arc<RecordingCompanion>,
}

impl HeadlessPlatform {
    pub fn new(url: &str) -> Self {
        Self::with_audio(url, HeadlessAudioFacility::new())
    }

    pub fn with_audio(url: &str, audio: HeadlessAudioFacility) -> Self {
        Self {
            document: HeadlessDocument::new(Some(url)),
            audio: Some(Arc::new(audio)),
            storage: Arc::new(MemoryStorage::new()),
            companion: Arc::new(RecordingCompanion::new()),
        }
    }

    pub fn without_audio(mut self) -> Self {
        self.audio = None;
        self
    }

    pub fn with_storage(mut self, storage: MemoryStorage) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn platform(&self) -> Platform {
        Platform {
            document: Arc::clone(&self.document) as Arc<dyn MediaDocument>,
            audio: self
                .audio
                .as_ref()
                .map(|audio| Arc::clone(audio) as Arc<dyn AudioFacility>),
            storage: Arc::clone(&self.storage) as Arc<dyn SettingsStorage>,
            companion: Arc::clone(&self.companion) as Arc<dyn CompanionChannel>,
        }
    }
}
