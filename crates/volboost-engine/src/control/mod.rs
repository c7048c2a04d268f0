mod actor;
mod engine_handle;
mod handlers;
mod messages;
mod startup;

use volboost_core::Platform;

use crate::types::EngineConfig;

pub type EngineHandle = engine_handle::EngineHandle;

pub async fn start_engine(platform: Platform) -> EngineHandle {
    startup::start_engine(platform).await
}

pub async fn start_engine_with_config(platform: Platform, config: EngineConfig) -> EngineHandle {
    startup::start_engine_with_config(platform, config).await
}
