//! Core configuration management types.

mod builder;
mod engine;
mod manager;
mod model;

pub use builder::ConfigManagerBuilder;
pub use engine::ReloadOutcome;
pub(crate) use engine::{Engine, SaveOptions};
pub use manager::ConfigManager;
pub use model::ConfigModel;
