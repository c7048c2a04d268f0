use crate::control::actor::ControlActor;

pub(crate) fn handle(actor: &mut ControlActor) -> bool {
    actor.schedule_rediscovery();
    false
}
