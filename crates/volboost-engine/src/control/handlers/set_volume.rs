use tokio::sync::oneshot;
use volboost_core::VolumeLevel;

use crate::control::actor::ControlActor;
use crate::types::ApplyReport;

pub(crate) fn handle(
    level: VolumeLevel,
    resp_tx: oneshot::Sender<ApplyReport>,
    actor: &mut ControlActor,
) -> bool {
    let report = actor.controller.request_volume(level);
    let _ = resp_tx.send(report);
    false
}
