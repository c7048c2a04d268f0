use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::control::handlers;
use crate::control::messages::ControlMessage;
use crate::controller::AmplificationController;
use crate::discovery::Subscription;
use crate::types::EngineConfig;

/// Sole owner of the engine state; messages are handled one at a time in
/// arrival order.
pub(crate) struct ControlActor {
    pub(crate) controller: AmplificationController,
    pub(crate) subscription: Option<Subscription>,
    pub(crate) config: EngineConfig,
    rediscovery_deadline: Option<Instant>,
}

impl ControlActor {
    pub(crate) fn new(
        controller: AmplificationController,
        subscription: Option<Subscription>,
        config: EngineConfig,
    ) -> Self {
        Self {
            controller,
            subscription,
            config,
            rediscovery_deadline: None,
        }
    }

    /// Queues an `apply()` pass, collapsing requests made within the debounce window.
    pub(crate) fn schedule_rediscovery(&mut self) {
        if self.config.rediscovery_debounce.is_zero() {
            self.run_rediscovery();
            return;
        }
        if self.rediscovery_deadline.is_none() {
            self.rediscovery_deadline = Some(Instant::now() + self.config.rediscovery_debounce);
        }
    }

    pub(crate) fn run_rediscovery(&mut self) {
        self.rediscovery_deadline = None;
        let report = self.controller.apply();
        if !report.skipped {
            debug!(?report, "rediscovery pass");
        }
    }

    pub(crate) async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<ControlMessage>) {
        loop {
            let message = match self.rediscovery_deadline {
                Some(deadline) => tokio::select! {
                    message = mailbox.recv() => message,
                    _ = tokio::time::sleep_until(deadline) => {
                        self.run_rediscovery();
                        continue;
                    }
                },
                None => mailbox.recv().await,
            };
            let Some(message) = message else {
                break;
            };
            if handlers::handle_message(message, &mut self) {
                break;
            }
        }
        info!("control actor exited");
    }
}
