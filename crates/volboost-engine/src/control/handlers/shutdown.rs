use tokio::sync::oneshot;
use tracing::debug;

use crate::control::actor::ControlActor;

pub(crate) fn handle(ack_tx: oneshot::Sender<()>, actor: &mut ControlActor) -> bool {
    if let Some(mut subscription) = actor.subscription.take() {
        subscription.cancel();
    }
    debug!(volume = %actor.controller.current_volume(), "control actor shutting down");
    let _ = ack_tx.send(());
    true
}
