use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use volboost_core::MediaKind;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub url: String,
    #[serde(default)]
    pub saved_volume: Option<Value>,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSpec {
    #[serde(default)]
    pub kind: ElementKind,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub playing: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Audio,
    #[default]
    Video,
}

impl From<ElementKind> for MediaKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Audio => MediaKind::Audio,
            ElementKind::Video => MediaKind::Video,
        }
    }
}

/// One scripted action. Elements are addressed by insertion order,
/// counting the scenario's initial elements first.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SetVolume(Value),
    Insert(ElementSpec),
    Play(usize),
    Pause(usize),
    Remove(usize),
    Companion(Value),
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse scenario {}", path.display()))
    }

    pub fn demo() -> Self {
        Self {
            url: "https://video.example.com/watch".to_string(),
            saved_volume: Some(json!(150)),
            elements: vec![ElementSpec {
                kind: ElementKind::Video,
                src: Some("https://cdn.example.com/clip.mp4".to_string()),
                playing: true,
            }],
            steps: vec![
                Step::SetVolume(json!(300)),
                Step::Insert(ElementSpec {
                    kind: ElementKind::Audio,
                    src: Some("https://cdn.example.com/track.mp3".to_string()),
                    playing: false,
                }),
                Step::Play(1),
                Step::Companion(json!({ "action": "getSoundVolume" })),
                Step::Companion(json!({
                    "action": "changeSoundVolume",
                    "data": { "soundVolume": 450 }
                })),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_shape() {
        let scenario: Scenario = serde_json::from_value(json!({
            "url": "https://page.test/",
            "saved_volume": 200,
            "elements": [{ "src": "https://cdn.test/a.mp4", "playing": true }],
            "steps": [
                { "set_volume": "350" },
                { "insert": { "kind": "audio" } },
                { "play": 1 },
                { "pause": 1 },
                { "remove": 0 },
                { "companion": { "action": "getSoundVolume" } }
            ]
        }))
        .expect("scenario parses");

        assert_eq!(scenario.elements.len(), 1);
        assert!(matches!(scenario.elements[0].kind, ElementKind::Video));
        assert_eq!(scenario.steps.len(), 6);
        assert!(matches!(&scenario.steps[0], Step::SetVolume(value) if value == "350"));
        assert!(matches!(
            &scenario.steps[1],
            Step::Insert(ElementSpec { kind: ElementKind::Audio, src: None, .. })
        ));
    }

    #[test]
    fn demo_addresses_only_existing_elements() {
        let demo = Scenario::demo();
        let mut count = demo.elements.len();
        for step in &demo.steps {
            match step {
                Step::Insert(_) => count += 1,
                Step::Play(index) | Step::Pause(index) | Step::Remove(index) => {
                    assert!(*index < count)
                },
                Step::SetVolume(_) | Step::Companion(_) => {},
            }
        }
    }
}
