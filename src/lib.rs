//! # hotswap-props
//!
//! Live-reloadable configuration bound to a properties file.
//!
//! ## Overview
//!
//! `hotswap-props` binds a typed configuration model to a `key=value` file:
//! - The file is created on first use and validated as a regular, writable file
//! - Its content is parsed and pushed into the model, with per-field defaults
//! - Changes made in code are written back with `save()`
//! - Optionally, the file is watched and the model reloads when it is edited
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_props::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct AppConfig {
//!     name: String,
//!     workers: u32,
//! }
//!
//! impl ConfigModel for AppConfig {
//!     fn load(&mut self, props: &Properties) -> std::result::Result<(), ValidationError> {
//!         self.name = props.get_or("name", "app").to_string();
//!         self.workers = props
//!             .get_or("workers", "4")
//!             .parse()
//!             .map_err(|_| ValidationError::invalid_field("workers", "not a number"))?;
//!         Ok(())
//!     }
//!
//!     fn to_properties(&self) -> Properties {
//!         [("name", self.name.clone()), ("workers", self.workers.to_string())]
//!             .into_iter()
//!             .collect()
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> hotswap_props::error::Result<()> {
//! // Creates the file if needed, loads it and watches it for edits
//! let manager = ConfigManager::open(AppConfig::default(), "config/app.properties", true)?;
//!
//! println!("Workers: {}", manager.read(|cfg| cfg.workers));
//!
//! manager.update(|cfg| cfg.workers = 8);
//! manager.save()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Existence guarantee**: missing files are created, unusable paths rejected
//! - **Change gating**: reloads that find identical content leave the model alone
//! - **Staged loads**: a failing load never leaves the model half updated
//! - **File watching**: automatic reload on modification (`file-watch`, default)
//! - **Reload subscribers**: callbacks after each applied reload
//! - **Metrics**: OpenTelemetry counters and histograms (`metrics`)

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigManager, ConfigManagerBuilder, ConfigModel, ReloadOutcome};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::notify::WatchState;
    pub use crate::sources::Properties;
}
