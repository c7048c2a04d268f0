use thiserror::Error;
use volboost_core::VolumeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("control actor exited")]
    MailboxClosed,
    #[error("control command timed out")]
    Timeout,
    #[error(transparent)]
    InvalidVolume(#[from] VolumeError),
}
