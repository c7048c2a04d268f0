use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use volboost_core::{
    DocumentEvent, DocumentEventSink, DocumentNode, MediaDocument, MediaElement,
    MediaElementHandle, MediaElementId, MediaKind, ObserverId, PlatformError,
};

#[derive(Debug, Default)]
struct ElementState {
    src: Option<String>,
    paused: bool,
    cross_origin: Option<String>,
    play_calls: usize,
}

#[derive(Debug)]
pub struct HeadlessMediaElement {
    id: MediaElementId,
    kind: MediaKind,
    state: Mutex<ElementState>,
}

impl HeadlessMediaElement {
    fn new(id: MediaElementId, kind: MediaKind, src: Option<&str>) -> Self {
        Self {
            id,
            kind,
            state: Mutex::new(ElementState {
                src: src.map(str::to_string),
                paused: true,
                ..ElementState::default()
            }),
        }
    }

    /// Changes the source as page script would, without going through the engine.
    pub fn assign_src(&self, src: &str) {
        self.state.lock().src = Some(src.to_string());
    }

    pub fn play_calls(&self) -> usize {
        self.state.lock().play_calls
    }

    fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
    }
}

impl MediaElement for HeadlessMediaElement {
    fn id(&self) -> MediaElementId {
        self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn current_src(&self) -> Option<String> {
        self.state.lock().src.clone().filter(|v| !v.is_empty())
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    fn cross_origin(&self) -> Option<String> {
        self.state.lock().cross_origin.clone()
    }

    fn set_cross_origin(&self, value: &str) -> Result<(), PlatformError> {
        self.state.lock().cross_origin = Some(value.to_string());
        Ok(())
    }

    fn set_src(&self, src: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.src = Some(src.to_string());
        // Reassigning the source stops playback, as in a browser.
        state.paused = true;
        Ok(())
    }

    fn play(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.play_calls += 1;
        state.paused = false;
        Ok(())
    }
}

/// A document subtree: optionally a media element, plus children.
pub struct HeadlessNode {
    media: Option<Arc<HeadlessMediaElement>>,
    children: Vec<Arc<HeadlessNode>>,
}

impl HeadlessNode {
    pub fn media(element: &Arc<HeadlessMediaElement>) -> Arc<Self> {
        Arc::new(Self {
            media: Some(Arc::clone(element)),
            children: Vec::new(),
        })
    }

    pub fn container(children: Vec<Arc<HeadlessNode>>) -> Arc<Self> {
        Arc::new(Self {
            media: None,
            children,
        })
    }

    fn collect(&self, out: &mut Vec<Arc<HeadlessMediaElement>>) {
        if let Some(media) = &self.media {
            out.push(Arc::clone(media));
        }
        for child in &self.children {
            child.collect(out);
        }
    }

    fn contains(&self, id: MediaElementId) -> bool {
        self.media.as_ref().is_some_and(|media| media.id == id)
            || self.children.iter().any(|child| child.contains(id))
    }
}

impl DocumentNode for HeadlessNode {
    fn as_media(&self) -> Option<MediaElementHandle> {
        self.media
            .as_ref()
            .map(|media| Arc::clone(media) as MediaElementHandle)
    }

    fn media_descendants(&self) -> Vec<MediaElementHandle> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect(&mut out);
        }
        out.into_iter()
            .map(|media| media as MediaElementHandle)
            .collect()
    }
}

#[derive(Default)]
struct DocumentState {
    roots: Vec<Arc<HeadlessNode>>,
    observers: Vec<(ObserverId, DocumentEventSink)>,
    playing_hooks: HashMap<MediaElementId, Vec<DocumentEventSink>>,
    next_observer: u64,
    refuse_observers: bool,
}

pub struct HeadlessDocument {
    url: Option<String>,
    next_element: AtomicU64,
    state: Mutex<DocumentState>,
}

impl HeadlessDocument {
    pub fn new(url: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            url: url.map(str::to_string),
            next_element: AtomicU64::new(1),
            state: Mutex::new(DocumentState::default()),
        })
    }

    /// Creates a detached element. The document keeps no reference until it is appended.
    pub fn create_element(&self, kind: MediaKind, src: Option<&str>) -> Arc<HeadlessMediaElement> {
        let id = MediaElementId(self.next_element.fetch_add(1, Ordering::Relaxed));
        Arc::new(HeadlessMediaElement::new(id, kind, src))
    }

    pub fn append_media(&self, element: &Arc<HeadlessMediaElement>) {
        self.append(HeadlessNode::media(element));
    }

    pub fn append(&self, node: Arc<HeadlessNode>) {
        let sinks = {
            let mut state = self.state.lock();
            state.roots.push(Arc::clone(&node));
            observer_sinks(&state)
        };
        let node: Arc<dyn DocumentNode> = node;
        for sink in sinks {
            sink(DocumentEvent::NodesAdded(vec![Arc::clone(&node)]));
        }
    }

    /// Detaches every top-level subtree containing `id` and returns them.
    pub fn remove(&self, id: MediaElementId) -> Vec<Arc<dyn DocumentNode>> {
        let (removed, sinks) = {
            let mut state = self.state.lock();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.roots)
                .into_iter()
                .partition(|node| node.contains(id));
            state.roots = kept;
            // Pending playback listeners go with the element, as in a browser.
            let mut detached = Vec::new();
            for node in &removed {
                node.collect(&mut detached);
            }
            for element in &detached {
                state.playing_hooks.remove(&element.id);
            }
            (removed, observer_sinks(&state))
        };
        let removed: Vec<Arc<dyn DocumentNode>> = removed
            .into_iter()
            .map(|node| node as Arc<dyn DocumentNode>)
            .collect();
        if !removed.is_empty() {
            for sink in sinks {
                sink(DocumentEvent::NodesRemoved(removed.clone()));
            }
        }
        removed
    }

    pub fn element(&self, id: MediaElementId) -> Option<Arc<HeadlessMediaElement>> {
        self.attached().into_iter().find(|element| element.id == id)
    }

    /// Starts playback and fires any pending one-shot playback listeners.
    pub fn start_playing(&self, id: MediaElementId) {
        let Some(element) = self.element(id) else {
            return;
        };
        element.set_paused(false);
        let hooks = self.state.lock().playing_hooks.remove(&id).unwrap_or_default();
        for hook in hooks {
            hook(DocumentEvent::MediaPlaying(id));
        }
    }

    pub fn pause(&self, id: MediaElementId) {
        if let Some(element) = self.element(id) {
            element.set_paused(true);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.len()
    }

    /// Makes `observe_mutations` fail, as a document without observer support would.
    pub fn refuse_observers(&self) {
        self.state.lock().refuse_observers = true;
    }

    fn attached(&self) -> Vec<Arc<HeadlessMediaElement>> {
        let state = self.state.lock();
        let mut out = Vec::new();
        for root in &state.roots {
            root.collect(&mut out);
        }
        out
    }
}

fn observer_sinks(state: &DocumentState) -> Vec<DocumentEventSink> {
    state
        .observers
        .iter()
        .map(|(_, sink)| Arc::clone(sink))
        .collect()
}

impl MediaDocument for HeadlessDocument {
    fn url(&self) -> Option<String> {
        self.url.clone()
    }

    fn media_elements(&self) -> Vec<MediaElementHandle> {
        self.attached()
            .into_iter()
            .map(|element| element as MediaElementHandle)
            .collect()
    }

    fn observe_mutations(&self, sink: DocumentEventSink) -> Result<ObserverId, PlatformError> {
        let mut state = self.state.lock();
        if state.refuse_observers {
            return Err(PlatformError::Rejected(
                "mutation observers unavailable".to_string(),
            ));
        }
        state.next_observer += 1;
        let id = ObserverId(state.next_observer);
        state.observers.push((id, sink));
        Ok(id)
    }

    fn disconnect(&self, observer: ObserverId) {
        self.state
            .lock()
            .observers
            .retain(|(id, _)| *id != observer);
    }

    fn once_playing(
        &self,
        element: &dyn MediaElement,
        sink: DocumentEventSink,
    ) -> Result<(), PlatformError> {
        self.state
            .lock()
            .playing_hooks
            .entry(element.id())
            .or_default()
            .push(sink);
        Ok(())
    }
}
