use volboost_core::DocumentEvent;

use crate::control::actor::ControlActor;

pub(crate) fn handle(event: DocumentEvent, actor: &mut ControlActor) -> bool {
    if actor.controller.on_document_event(event) {
        actor.schedule_rediscovery();
    }
    false
}
