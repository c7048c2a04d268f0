mod cli;
mod scenario;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use volboost_core::{MediaElement, VolumeLevel};
use volboost_engine::policy::HostPolicyConfig;
use volboost_engine::state::SAVED_VOLUME_KEY;
use volboost_engine::types::{EngineConfig, EngineSnapshot};
use volboost_engine::{EngineHandle, start_engine_with_config};
use volboost_headless::{
    HeadlessAudioFacility, HeadlessMediaElement, HeadlessPlatform, MemoryStorage,
};

use cli::Cli;
use scenario::{ElementSpec, Scenario, Step};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let scenario = match cli.scenario.as_deref() {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo(),
    };
    let mut config = EngineConfig::default();
    if let Some(path) = cli.host_policy.as_deref() {
        config.host_policy = load_host_policy(path)?;
    }
    let settle = config.rediscovery_debounce * 2;

    let headless = build_platform(&cli, &scenario);
    let mut elements = Vec::new();
    for spec in &scenario.elements {
        elements.push(insert(&headless, spec));
    }

    let handle = start_engine_with_config(headless.platform(), config).await;
    info!(url = %scenario.url, elements = elements.len(), "engine started");

    for step in &scenario.steps {
        run_step(&handle, &headless, &mut elements, step).await?;
        tokio::time::sleep(settle).await;
    }
    if let Some(volume) = cli.volume {
        let level = VolumeLevel::new(volume).context("invalid --volume")?;
        let report = handle.set_volume(level).await?;
        info!(?report, "final volume requested");
    }

    let snapshot = handle.snapshot().await?;
    print_summary(&headless, &elements, &snapshot);
    handle.shutdown().await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_host_policy(path: &Path) -> Result<HostPolicyConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read host policy {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse host policy {}", path.display()))
}

fn build_platform(cli: &Cli, scenario: &Scenario) -> HeadlessPlatform {
    let facility = HeadlessAudioFacility::new().with_max_contexts(cli.max_contexts);
    let mut headless = HeadlessPlatform::with_audio(&scenario.url, facility);
    if cli.no_audio_facility {
        headless = headless.without_audio();
    }
    if let Some(saved) = scenario.saved_volume.clone() {
        headless = headless.with_storage(MemoryStorage::with_value(SAVED_VOLUME_KEY, saved));
    }
    headless
}

fn insert(headless: &HeadlessPlatform, spec: &ElementSpec) -> Arc<HeadlessMediaElement> {
    let element = headless
        .document
        .create_element(spec.kind.into(), spec.src.as_deref());
    headless.document.append_media(&element);
    if spec.playing {
        headless.document.start_playing(element.id());
    }
    element
}

fn element_at(
    elements: &[Arc<HeadlessMediaElement>],
    index: usize,
) -> Result<&Arc<HeadlessMediaElement>> {
    elements
        .get(index)
        .ok_or_else(|| anyhow!("scenario refers to element {index}, only {} exist", elements.len()))
}

async fn run_step(
    handle: &EngineHandle,
    headless: &HeadlessPlatform,
    elements: &mut Vec<Arc<HeadlessMediaElement>>,
    step: &Step,
) -> Result<()> {
    match step {
        Step::SetVolume(raw) => match handle.set_volume_raw(raw).await {
            Ok(report) => info!(volume = %raw, ?report, "volume requested"),
            Err(err) => warn!(volume = %raw, error = %err, "volume request rejected"),
        },
        Step::Insert(spec) => {
            let element = insert(headless, spec);
            info!(element = %element.id(), src = ?spec.src, "element inserted");
            elements.push(element);
        },
        Step::Play(index) => {
            let id = element_at(elements, *index)?.id();
            headless.document.start_playing(id);
        },
        Step::Pause(index) => {
            let id = element_at(elements, *index)?.id();
            headless.document.pause(id);
        },
        Step::Remove(index) => {
            let id = element_at(elements, *index)?.id();
            headless.document.remove(id);
        },
        Step::Companion(message) => {
            let reply = handle.companion_message(message.clone()).await?;
            println!(
                "companion {} -> {}",
                message,
                reply.as_ref().map_or_else(|| "(no reply)".to_string(), Value::to_string)
            );
        },
    }
    Ok(())
}

fn print_summary(
    headless: &HeadlessPlatform,
    elements: &[Arc<HeadlessMediaElement>],
    snapshot: &EngineSnapshot,
) {
    println!(
        "volume {} (persisted {}, page policy {:?}, audio routing {})",
        snapshot.current(),
        snapshot.volume.persisted,
        snapshot.page_policy,
        snapshot.audio_routing
    );
    for element in elements {
        let id = element.id();
        let gain = headless
            .audio
            .as_ref()
            .and_then(|audio| audio.gain_value(id))
            .map_or_else(|| "-".to_string(), |gain| format!("{gain:.2}"));
        let graph = snapshot
            .graph(id)
            .map_or_else(|| "none".to_string(), |entry| format!("{:?}", entry.status));
        println!(
            "  {id} src={} paused={} graph={graph} gain={gain}",
            element.current_src().unwrap_or_default(),
            element.is_paused()
        );
    }
    let volumes = headless.companion.sound_volumes();
    if !volumes.is_empty() {
        println!("companion notices: {volumes:?}");
    }
}
