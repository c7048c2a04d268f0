//! Finding playable elements: an eager scan plus a live mutation subscription.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};
use volboost_core::{
    DocumentEventSink, DocumentNode, MediaDocument, MediaElementHandle, MediaElementId,
    ObserverId, PlatformError,
};

/// Live document observation. Cancelled explicitly or on drop.
pub struct Subscription {
    document: Arc<dyn MediaDocument>,
    observer: Option<ObserverId>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.observer.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(observer) = self.observer.take() {
            self.document.disconnect(observer);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct MediaDiscovery {
    document: Arc<dyn MediaDocument>,
    processed: HashSet<MediaElementId>,
    sink: Option<DocumentEventSink>,
}

impl MediaDiscovery {
    pub fn new(document: Arc<dyn MediaDocument>) -> Self {
        Self {
            document,
            processed: HashSet::new(),
            sink: None,
        }
    }

    pub fn document(&self) -> &Arc<dyn MediaDocument> {
        &self.document
    }

    /// All currently attached playable elements, collected now.
    pub fn scan_existing(&self) -> Vec<MediaElementHandle> {
        self.document.media_elements()
    }

    pub fn any_playing(&self) -> bool {
        self.scan_existing().iter().any(|element| !element.is_paused())
    }

    pub fn find(&self, id: MediaElementId) -> Option<MediaElementHandle> {
        self.scan_existing()
            .into_iter()
            .find(|element| element.id() == id)
    }

    /// Subscribes `sink` to document mutations. The same sink receives the
    /// one-shot playback notifications registered for discovered elements.
    pub fn observe_new_elements(
        &mut self,
        sink: DocumentEventSink,
    ) -> Result<Subscription, PlatformError> {
        self.sink = Some(Arc::clone(&sink));
        let observer = self.document.observe_mutations(sink)?;
        Ok(Subscription {
            document: Arc::clone(&self.document),
            observer: Some(observer),
        })
    }

    /// Marks an element as discovered. Returns `false` if it already was.
    pub fn mark_discovered(&mut self, element: &MediaElementHandle) -> bool {
        if !self.processed.insert(element.id()) {
            return false;
        }
        self.watch_playback(element);
        true
    }

    /// Playable elements in the added subtrees not reported before.
    pub fn accept_added(&mut self, nodes: &[Arc<dyn DocumentNode>]) -> Vec<MediaElementHandle> {
        let mut found = Vec::new();
        for element in nodes.iter().flat_map(|node| media_in(node.as_ref())) {
            if self.mark_discovered(&element) {
                debug!(element = %element.id(), kind = ?element.kind(), "media element discovered");
                found.push(element);
            }
        }
        found
    }

    /// Forgets elements in the removed subtrees so a reinsertion is reported again.
    pub fn accept_removed(&mut self, nodes: &[Arc<dyn DocumentNode>]) -> Vec<MediaElementId> {
        nodes
            .iter()
            .flat_map(|node| media_in(node.as_ref()))
            .map(|element| element.id())
            .filter(|id| self.processed.remove(id))
            .collect()
    }

    pub fn discovered_count(&self) -> usize {
        self.processed.len()
    }

    fn watch_playback(&self, element: &MediaElementHandle) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if let Err(err) = self.document.once_playing(element.as_ref(), Arc::clone(sink)) {
            warn!(element = %element.id(), error = %err, "failed to watch media playback");
        }
    }
}

fn media_in(node: &dyn DocumentNode) -> Vec<MediaElementHandle> {
    let mut elements: Vec<MediaElementHandle> = node.as_media().into_iter().collect();
    elements.extend(node.media_descendants());
    elements
}
