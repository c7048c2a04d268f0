#![deny(clippy::wildcard_imports)]

pub mod control;
pub mod controller;
pub mod discovery;
mod error;
pub mod graph;
pub mod policy;
pub mod relay;
pub mod state;
pub mod types;

pub use control::{EngineHandle, start_engine, start_engine_with_config};
pub use error::EngineError;
