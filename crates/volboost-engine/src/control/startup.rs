use std::sync::Arc;

use tokio::sync::mpsc;
use volboost_core::{DocumentEventSink, Platform};

use crate::control::actor::ControlActor;
use crate::control::engine_handle::EngineHandle;
use crate::control::messages::ControlMessage;
use crate::controller::AmplificationController;
use crate::state::VolumeStore;
use crate::types::EngineConfig;

pub(crate) async fn start_engine(platform: Platform) -> EngineHandle {
    start_engine_with_config(platform, EngineConfig::default()).await
}

pub(crate) async fn start_engine_with_config(
    platform: Platform,
    config: EngineConfig,
) -> EngineHandle {
    let volume = VolumeStore::load(Arc::clone(&platform.storage), config.storage_key.clone()).await;
    let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();

    // The document outlives the engine; a strong sender here would keep the
    // actor alive after every handle is dropped.
    let sink_tx = mailbox_tx.downgrade();
    let sink: DocumentEventSink = Arc::new(move |event| {
        if let Some(tx) = sink_tx.upgrade() {
            let _ = tx.send(ControlMessage::Document(event));
        }
    });

    let mut controller = AmplificationController::new(&platform, &config, volume);
    let subscription = controller.start(sink);
    let actor = ControlActor::new(controller, subscription, config.clone());
    tokio::spawn(actor.run(mailbox_rx));

    EngineHandle::new(mailbox_tx, config.command_timeout)
}
