use serde_json::Value;
use tokio::sync::oneshot;

use crate::control::actor::ControlActor;

pub(crate) fn handle(
    message: Value,
    resp_tx: oneshot::Sender<Option<Value>>,
    actor: &mut ControlActor,
) -> bool {
    let reply = actor.controller.handle_companion_message(&message);
    let _ = resp_tx.send(reply);
    false
}
