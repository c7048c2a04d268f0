use tokio::sync::oneshot;

use crate::control::actor::ControlActor;
use crate::types::EngineSnapshot;

pub(crate) fn handle(resp_tx: oneshot::Sender<EngineSnapshot>, actor: &mut ControlActor) -> bool {
    let _ = resp_tx.send(actor.controller.snapshot());
    false
}
