use serde_json::Value;

use crate::error::RelayError;

/// Outbound half of the companion process channel. Inbound requests are
/// delivered to the engine by the host integration.
pub trait CompanionChannel: Send + Sync {
    fn send(&self, message: Value) -> Result<(), RelayError>;
}
