use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VolumeError {
    #[error("volume {value} is outside 0..=600")]
    OutOfRange { value: i64 },
    #[error("volume is not a whole number: {raw}")]
    NonNumeric { raw: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),
    #[error("settings storage access denied")]
    Denied,
    #[error("stored value for `{key}` is corrupt")]
    Corrupt { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("no companion listener")]
    NoListener,
    #[error("companion channel closed")]
    ChannelClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("audio context limit reached ({limit} per document)")]
    ContextLimit { limit: usize },
    #[error("audio context closed")]
    ContextClosed,
    #[error("media source rejected: {0}")]
    SourceRejected(String),
    #[error("element already bound to a media source node")]
    AlreadyBound,
    #[error("node connection failed: {0}")]
    Connect(String),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("element is detached from the document")]
    Detached,
    #[error("document rejected the operation: {0}")]
    Rejected(String),
}
