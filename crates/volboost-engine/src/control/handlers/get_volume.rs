use tokio::sync::oneshot;
use volboost_core::VolumeLevel;

use crate::control::actor::ControlActor;

pub(crate) fn handle(resp_tx: oneshot::Sender<VolumeLevel>, actor: &mut ControlActor) -> bool {
    let _ = resp_tx.send(actor.controller.current_volume());
    false
}
