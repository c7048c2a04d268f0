use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::StorageError;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Durable key/value settings owned by an external backend.
pub trait SettingsStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageFuture<'_, Option<Value>>;

    /// Issues a write without waiting for it to land.
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
}
