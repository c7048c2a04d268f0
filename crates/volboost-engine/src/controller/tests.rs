use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;
use volboost_core::{DocumentEvent, DocumentEventSink, MediaElement, MediaKind, VolumeLevel};
use volboost_headless::{HeadlessAudioFacility, HeadlessMediaElement, HeadlessPlatform};

use crate::controller::AmplificationController;
use crate::discovery::Subscription;
use crate::graph::GraphStatus;
use crate::policy::{HostMatchMode, HostPolicy, HostPolicyConfig};
use crate::state::{SAVED_VOLUME_KEY, VolumeStore};
use crate::types::{ElementOutcome, EngineConfig};

fn level(percent: i64) -> VolumeLevel {
    VolumeLevel::new(percent).expect("valid level")
}

fn test_config() -> EngineConfig {
    EngineConfig {
        host_policy: HostPolicyConfig {
            ignored_hosts: vec!["ignored.test".to_string()],
            fallback_hosts: vec!["drm.test".to_string()],
            ignored_match: HostMatchMode::Suffix,
        },
        gain_time_constant: Duration::ZERO,
        ..EngineConfig::default()
    }
}

struct Harness {
    headless: HeadlessPlatform,
    controller: AmplificationController,
    events: Arc<Mutex<Vec<DocumentEvent>>>,
    _subscription: Option<Subscription>,
}

impl Harness {
    fn start(headless: HeadlessPlatform, saved: VolumeLevel) -> Self {
        let platform = headless.platform();
        let volume =
            VolumeStore::with_persisted(Arc::clone(&platform.storage), SAVED_VOLUME_KEY, saved);
        let mut controller = AmplificationController::new(&platform, &test_config(), volume);
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let sink: DocumentEventSink = Arc::new(move |event| captured.lock().push(event));
        let subscription = controller.start(sink);
        Self {
            headless,
            controller,
            events,
            _subscription: subscription,
        }
    }

    /// Feeds queued document notifications to the controller, as the control actor would.
    fn pump(&mut self) {
        let pending = std::mem::take(&mut *self.events.lock());
        for event in pending {
            self.controller.on_document_event(event);
        }
    }

    fn audio(&self) -> &HeadlessAudioFacility {
        self.headless
            .audio
            .as_deref()
            .expect("headless platform has audio routing")
    }

    fn add_element(&self, src: Option<&str>) -> Arc<HeadlessMediaElement> {
        let element = self.headless.document.create_element(MediaKind::Video, src);
        self.headless.document.append_media(&element);
        element
    }

    fn writes(&self) -> usize {
        self.headless.storage.writes().len()
    }

    fn notices(&self) -> usize {
        self.headless.companion.sent().len()
    }
}

#[test]
fn idle_nominal_document_short_circuits_until_volume_moves() {
    let headless = HeadlessPlatform::new("https://page.test/watch");
    let element = headless
        .document
        .create_element(MediaKind::Video, Some("https://cdn.test/a.mp4"));
    headless.document.append_media(&element);
    let mut h = Harness::start(headless, VolumeLevel::NOMINAL);

    assert_eq!(h.writes(), 0);
    assert_eq!(h.notices(), 0);

    let report = h.controller.apply();
    assert!(report.skipped);
    assert_eq!(h.writes(), 0);
    assert_eq!(h.notices(), 0);

    h.headless.document.start_playing(element.id());
    h.pump();
    let report = h.controller.apply();
    assert!(!report.persisted);
    assert!(!report.notified);
    assert_eq!(report.applied, 0);
    assert_eq!(report.deferred, 1);
    assert_eq!(h.writes(), 0);
    assert_eq!(h.notices(), 0);
    assert_eq!(h.audio().gain_mutations(element.id()), 0);
    assert!(h.controller.snapshot().graph(element.id()).is_none());
}

#[test]
fn raising_volume_persists_notifies_and_sets_gain() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/watch"),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();

    let report = h.controller.request_volume(level(300));

    assert!(report.persisted);
    assert!(report.notified);
    assert_eq!(report.applied, 1);
    assert_eq!(
        h.headless.storage.writes(),
        vec![(SAVED_VOLUME_KEY.to_string(), json!(300))]
    );
    assert_eq!(h.headless.companion.sound_volumes().last(), Some(&300));
    assert_eq!(h.audio().gain_value(element.id()), Some(3.0));
    assert_eq!(h.controller.volume_state().last_applied, Some(level(300)));
}

#[test]
fn duplicate_request_changes_nothing() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/watch"),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();
    h.controller.request_volume(level(300));
    let writes = h.writes();
    let notices = h.notices();

    let report = h.controller.request_volume(level(300));

    assert!(!report.persisted);
    assert!(!report.notified);
    assert_eq!(h.writes(), writes);
    assert_eq!(h.notices(), notices);
    assert_eq!(h.audio().gain_mutations(element.id()), 1);
}

#[test]
fn fallback_hosts_are_notified_but_never_routed() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/watch"),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://cdn.drm.test/v.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();

    let report = h.controller.request_volume(level(250));

    assert!(report.notified);
    assert_eq!(report.delegated, 1);
    assert_eq!(report.applied, 0);
    assert_eq!(h.headless.companion.sound_volumes().last(), Some(&250));
    assert_eq!(h.audio().source_attempts(element.id()), 0);
}

#[test]
fn fallback_page_delegates_every_element() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://www.drm.test/title/1"),
        VolumeLevel::NOMINAL,
    );
    assert_eq!(h.controller.page_policy(), HostPolicy::SourceRewriteForbidden);
    h.add_element(Some("https://cdn.test/v.mp4"));
    h.pump();

    let report = h.controller.request_volume(level(400));

    assert_eq!(report.delegated, 1);
    assert_eq!(h.audio().contexts_created(), 0);
}

#[test]
fn ignored_hosts_never_get_a_graph() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://media.ignored.test/call.webm"));
    h.headless.document.start_playing(element.id());
    h.pump();

    for percent in [200, 300, 400] {
        h.controller.request_volume(level(percent));
    }

    assert!(h.controller.snapshot().graph(element.id()).is_none());
    assert_eq!(h.audio().source_attempts(element.id()), 0);
}

#[test]
fn invalid_requests_leave_volume_untouched() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(200));
    let writes = h.writes();

    for raw in [json!(601), json!(-1), json!("abc"), json!(null), json!(99.5)] {
        assert!(h.controller.request_volume_raw(&raw).is_err());
        let reply = h.controller.handle_companion_message(&json!({
            "action": "changeSoundVolume",
            "data": { "soundVolume": raw }
        }));
        assert_eq!(reply, Some(json!({ "soundVolume": 200 })));
    }

    assert_eq!(h.controller.current_volume(), level(200));
    assert_eq!(h.writes(), writes);
}

#[test]
fn inserted_element_picks_up_current_level_without_trigger() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(300));

    let element = h.add_element(Some("https://cdn.test/late.mp4"));
    h.pump();
    assert_eq!(h.audio().gain_value(element.id()), Some(3.0));

    h.headless.document.start_playing(element.id());
    h.pump();
    assert_eq!(h.audio().gain_value(element.id()), Some(3.0));
    assert_eq!(h.audio().gain_mutations(element.id()), 1);
}

#[test]
fn element_without_source_is_amplified_once_it_plays() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(350));

    let element = h.add_element(None);
    h.pump();
    assert!(h.controller.snapshot().graph(element.id()).is_none());

    element.assign_src("https://cdn.test/stream.mp4");
    h.headless.document.start_playing(element.id());
    h.pump();

    assert_eq!(h.audio().gain_value(element.id()), Some(3.5));
}

#[test]
fn companion_requests_always_get_a_reply() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        level(180),
    );
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.pump();

    assert_eq!(
        h.controller
            .handle_companion_message(&json!({ "action": "getSoundVolume" })),
        Some(json!({ "soundVolume": 180 }))
    );
    assert_eq!(
        h.controller.handle_companion_message(&json!({
            "action": "changeSoundVolume",
            "data": { "soundVolume": 450 }
        })),
        Some(json!({ "soundVolume": 450 }))
    );
    assert_eq!(h.audio().gain_value(element.id()), Some(4.5));
    assert_eq!(
        h.controller
            .handle_companion_message(&json!({ "action": "toggleMute" })),
        None
    );
}

#[test]
fn contexts_without_audio_routing_only_persist_and_notify() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/").without_audio(),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();

    let report = h.controller.request_volume(level(500));

    assert!(report.persisted);
    assert!(report.notified);
    assert_eq!(report.applied, 0);
    assert!(!h.controller.snapshot().audio_routing);
}

#[test]
fn hostile_sources_fail_once_and_stay_failed() {
    let headless = HeadlessPlatform::with_audio(
        "https://page.test/",
        HeadlessAudioFacility::new().reject_sources_from("hostile.test"),
    );
    let mut h = Harness::start(headless, VolumeLevel::NOMINAL);
    let element = h.add_element(Some("https://hostile.test/v.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();

    for percent in [200, 300, 400, 500] {
        let report = h.controller.request_volume(level(percent));
        assert_eq!(report.unavailable, 1);
    }

    assert_eq!(h.audio().source_attempts(element.id()), 1);
    assert_eq!(
        h.controller
            .snapshot()
            .graph(element.id())
            .map(|entry| entry.status),
        Some(GraphStatus::Failed)
    );
}

#[test]
fn found_element_outcome_reflects_policy() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(300));
    let normal = h.add_element(Some("https://cdn.test/a.mp4"));
    let fallback = h.add_element(Some("https://drm.test/b.mp4"));

    assert_eq!(
        h.controller.on_element_found(&(normal as Arc<dyn MediaElement>)),
        ElementOutcome::Applied
    );
    assert_eq!(
        h.controller.on_element_found(&(fallback as Arc<dyn MediaElement>)),
        ElementOutcome::Delegated
    );
}

#[test]
fn refused_observation_still_serves_existing_elements() {
    let headless = HeadlessPlatform::new("https://page.test/");
    headless.document.refuse_observers();
    let element = headless
        .document
        .create_element(MediaKind::Audio, Some("https://cdn.test/a.mp3"));
    headless.document.append_media(&element);
    headless.document.start_playing(element.id());

    let mut h = Harness::start(headless, level(200));

    assert!(h._subscription.is_none());
    assert_eq!(h.audio().gain_value(element.id()), Some(2.0));
    let report = h.controller.request_volume(level(350));
    assert_eq!(report.applied, 1);
    assert_eq!(h.audio().gain_value(element.id()), Some(3.5));
}

#[test]
fn idle_start_sends_nothing_to_the_companion() {
    let h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );

    assert!(h.headless.companion.sent().is_empty());
    assert_eq!(h.writes(), 0);
    assert_eq!(
        h.controller.volume_state().last_applied,
        Some(VolumeLevel::NOMINAL)
    );
}

#[test]
fn removed_element_loses_its_graph_entry() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(300));
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.pump();
    let id = element.id();
    assert!(h.controller.snapshot().graph(id).is_some());

    drop(element);
    h.headless.document.remove(id);
    h.pump();

    assert!(h.controller.snapshot().graph(id).is_none());
}

#[test]
fn source_moving_to_fallback_host_returns_gain_to_unity() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    h.headless.document.start_playing(element.id());
    h.pump();
    h.controller.request_volume(level(300));
    assert_eq!(h.audio().gain_value(element.id()), Some(3.0));

    element.assign_src("https://cdn.drm.test/b.mp4");
    let report = h.controller.request_volume(level(400));

    assert_eq!(report.delegated, 1);
    assert_eq!(report.applied, 0);
    assert_eq!(h.audio().gain_value(element.id()), Some(1.0));
    assert_eq!(h.headless.companion.sound_volumes(), vec![300, 400]);
}

#[test]
fn found_element_gets_the_target_even_while_paused() {
    let mut h = Harness::start(
        HeadlessPlatform::new("https://page.test/"),
        VolumeLevel::NOMINAL,
    );
    h.controller.request_volume(level(250));
    let element = h.add_element(Some("https://cdn.test/a.mp4"));
    let handle: Arc<dyn MediaElement> = element.clone();

    assert_eq!(h.controller.on_element_found(&handle), ElementOutcome::Applied);
    assert_eq!(h.controller.on_element_found(&handle), ElementOutcome::Applied);

    assert!(element.is_paused());
    assert_eq!(h.audio().gain_value(element.id()), Some(2.5));
    assert_eq!(h.audio().gain_mutations(element.id()), 1);
}
