//! Message protocol shared with the companion process.
//!
//! Both directions use `{action, data: {soundVolume}}`; replies carry only
//! `{soundVolume}`.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;
use volboost_core::VolumeLevel;
use volboost_core::companion::CompanionChannel;

pub const ACTION_CHANGE_SOUND_VOLUME: &str = "changeSoundVolume";
pub const ACTION_GET_SOUND_VOLUME: &str = "getSoundVolume";

#[derive(Debug, Clone, PartialEq)]
pub enum CompanionRequest {
    /// Carries the raw requested value; validation happens in the volume store.
    ChangeSoundVolume { requested: Value },
    GetSoundVolume,
}

impl CompanionRequest {
    /// `None` for malformed messages and unrecognized actions.
    pub fn parse(message: &Value) -> Option<Self> {
        match message.get("action")?.as_str()? {
            ACTION_CHANGE_SOUND_VOLUME => Some(Self::ChangeSoundVolume {
                requested: message
                    .pointer("/data/soundVolume")
                    .cloned()
                    .unwrap_or(Value::Null),
            }),
            ACTION_GET_SOUND_VOLUME => Some(Self::GetSoundVolume),
            _ => None,
        }
    }
}

pub fn volume_reply(level: VolumeLevel) -> Value {
    json!({ "soundVolume": level.percent() })
}

pub fn volume_notice(level: VolumeLevel) -> Value {
    json!({
        "action": ACTION_CHANGE_SOUND_VOLUME,
        "data": { "soundVolume": level.percent() },
    })
}

pub struct SyncRelay {
    channel: Arc<dyn CompanionChannel>,
}

impl SyncRelay {
    pub fn new(channel: Arc<dyn CompanionChannel>) -> Self {
        Self { channel }
    }

    /// Best-effort push of the current target. Returns whether the send was accepted.
    pub fn notify(&self, level: VolumeLevel) -> bool {
        match self.channel.send(volume_notice(level)) {
            Ok(()) => true,
            Err(err) => {
                debug!(volume = %level, error = %err, "companion notification dropped");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use volboost_headless::RecordingCompanion;

    use super::*;

    #[test]
    fn parses_both_request_shapes() {
        assert_eq!(
            CompanionRequest::parse(&json!({
                "action": "changeSoundVolume",
                "data": { "soundVolume": 320 }
            })),
            Some(CompanionRequest::ChangeSoundVolume {
                requested: json!(320)
            })
        );
        assert_eq!(
            CompanionRequest::parse(&json!({ "action": "getSoundVolume" })),
            Some(CompanionRequest::GetSoundVolume)
        );
    }

    #[test]
    fn change_without_payload_is_still_recognized() {
        assert_eq!(
            CompanionRequest::parse(&json!({ "action": "changeSoundVolume" })),
            Some(CompanionRequest::ChangeSoundVolume {
                requested: Value::Null
            })
        );
    }

    #[test]
    fn ignores_unknown_and_malformed_messages() {
        assert_eq!(CompanionRequest::parse(&json!({ "action": "mute" })), None);
        assert_eq!(CompanionRequest::parse(&json!({ "action": 7 })), None);
        assert_eq!(CompanionRequest::parse(&json!("changeSoundVolume")), None);
        assert_eq!(CompanionRequest::parse(&json!(null)), None);
    }

    #[test]
    fn notify_swallows_missing_listener() {
        let companion = Arc::new(RecordingCompanion::new());
        let relay = SyncRelay::new(Arc::clone(&companion) as Arc<dyn CompanionChannel>);
        let level = VolumeLevel::new(300).expect("valid level");

        assert!(relay.notify(level));
        companion.disconnect();
        assert!(!relay.notify(level));

        assert_eq!(
            companion.sent(),
            vec![json!({ "action": "changeSoundVolume", "data": { "soundVolume": 300 } })]
        );
    }
}
