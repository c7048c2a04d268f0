use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use volboost_core::VolumeLevel;

use crate::control::messages::ControlMessage;
use crate::error::EngineError;
use crate::types::{ApplyReport, EngineSnapshot};

#[derive(Clone)]
pub struct EngineHandle {
    mailbox: mpsc::UnboundedSender<ControlMessage>,
    timeout: Duration,
}

impl EngineHandle {
    pub(crate) fn new(mailbox: mpsc::UnboundedSender<ControlMessage>, timeout: Duration) -> Self {
        Self { mailbox, timeout }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControlMessage,
    ) -> Result<T, EngineError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.mailbox
            .send(build(resp_tx))
            .map_err(|_| EngineError::MailboxClosed)?;
        match tokio::time::timeout(self.timeout, resp_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(EngineError::MailboxClosed),
            Err(_) => Err(EngineError::Timeout),
        }
    }

    pub async fn set_volume(&self, level: VolumeLevel) -> Result<ApplyReport, EngineError> {
        self.call(|resp_tx| ControlMessage::SetVolume { level, resp_tx })
            .await
    }

    /// Validates `raw` before it reaches the engine.
    pub async fn set_volume_raw(&self, raw: &Value) -> Result<ApplyReport, EngineError> {
        let level = VolumeLevel::from_json(raw)?;
        self.set_volume(level).await
    }

    pub async fn volume(&self) -> Result<VolumeLevel, EngineError> {
        self.call(|resp_tx| ControlMessage::GetVolume { resp_tx })
            .await
    }

    /// Delivers a companion request; `Ok(None)` means the message warrants no reply.
    pub async fn companion_message(&self, message: Value) -> Result<Option<Value>, EngineError> {
        self.call(|resp_tx| ControlMessage::CompanionMessage { message, resp_tx })
            .await
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot, EngineError> {
        self.call(|resp_tx| ControlMessage::GetSnapshot { resp_tx })
            .await
    }

    /// Requests a debounced `apply()` pass without waiting for it.
    pub fn rediscover(&self) -> Result<(), EngineError> {
        self.mailbox
            .send(ControlMessage::Rediscover)
            .map_err(|_| EngineError::MailboxClosed)
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.call(|ack_tx| ControlMessage::Shutdown { ack_tx })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}
