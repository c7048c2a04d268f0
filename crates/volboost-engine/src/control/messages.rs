use serde_json::Value;
use tokio::sync::oneshot;
use volboost_core::{DocumentEvent, VolumeLevel};

use crate::types::{ApplyReport, EngineSnapshot};

pub(crate) enum ControlMessage {
    SetVolume {
        level: VolumeLevel,
        resp_tx: oneshot::Sender<ApplyReport>,
    },
    GetVolume {
        resp_tx: oneshot::Sender<VolumeLevel>,
    },
    CompanionMessage {
        message: Value,
        resp_tx: oneshot::Sender<Option<Value>>,
    },
    Document(DocumentEvent),
    Rediscover,
    GetSnapshot {
        resp_tx: oneshot::Sender<EngineSnapshot>,
    },
    Shutdown {
        ack_tx: oneshot::Sender<()>,
    },
}
