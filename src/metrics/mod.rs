//! Built-in metrics for reload and save operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Reload attempts, applied/unchanged outcomes and failures
//! - Reload duration
//! - Save success/failures
//! - Active reload subscribers
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_props::prelude::*;
//! use opentelemetry::global;
//!
//! # #[derive(Clone)] struct AppConfig;
//! # impl ConfigModel for AppConfig {
//! #     fn load(&mut self, _: &Properties) -> std::result::Result<(), ValidationError> { Ok(()) }
//! #     fn to_properties(&self) -> Properties { Properties::new() }
//! # }
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let manager = ConfigManager::builder("app.properties")
//!     .with_metrics(meter)
//!     .build(AppConfig)?;
//! # Ok(())
//! # }
//! ```

mod config_metrics;

pub use config_metrics::ConfigMetrics;
