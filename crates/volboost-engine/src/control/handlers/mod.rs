mod companion_message;
mod document_event;
mod get_snapshot;
mod get_volume;
mod rediscover;
mod set_volume;
mod shutdown;

use crate::control::actor::ControlActor;
use crate::control::messages::ControlMessage;

/// Returns `true` when the actor should exit.
pub(crate) fn handle_message(message: ControlMessage, actor: &mut ControlActor) -> bool {
    match message {
        ControlMessage::SetVolume { level, resp_tx } => set_volume::handle(level, resp_tx, actor),
        ControlMessage::GetVolume { resp_tx } => get_volume::handle(resp_tx, actor),
        ControlMessage::CompanionMessage { message, resp_tx } => {
            companion_message::handle(message, resp_tx, actor)
        },
        ControlMessage::Document(event) => document_event::handle(event, actor),
        ControlMessage::Rediscover => rediscover::handle(actor),
        ControlMessage::GetSnapshot { resp_tx } => get_snapshot::handle(resp_tx, actor),
        ControlMessage::Shutdown { ack_tx } => shutdown::handle(ack_tx, actor),
    }
}
