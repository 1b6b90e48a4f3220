//! Builder for constructing ConfigManager instances.

use crate::core::{ConfigManager, ConfigModel, Engine, SaveOptions};
use crate::error::Result;
use crate::sources::PropertiesFile;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// Builder for constructing a [`ConfigManager`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_props::prelude::*;
/// use std::time::Duration;
///
/// # #[derive(Clone, Default)] struct AppConfig;
/// # impl ConfigModel for AppConfig {
/// #     fn load(&mut self, _: &Properties) -> std::result::Result<(), ValidationError> { Ok(()) }
/// #     fn to_properties(&self) -> Properties { Properties::new() }
/// # }
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let manager = ConfigManager::builder("config/app.properties")
///     .with_file_watch(true)
///     .with_watch_debounce(Duration::from_millis(200))
///     .with_atomic_save(true)
///     .with_header("Application settings")
///     .build(AppConfig::default())?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigManagerBuilder {
    path: PathBuf,
    file_watch: bool,
    #[cfg_attr(not(feature = "file-watch"), allow(dead_code))]
    watch_debounce: Duration,
    save_options: SaveOptions,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

impl ConfigManagerBuilder {
    /// Create a new builder for the file at `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_watch: false,
            watch_debounce: Duration::ZERO,
            save_options: SaveOptions::default(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Reload automatically when the file is modified.
    ///
    /// Requires the `file-watch` feature and a tokio runtime at build time.
    /// When either is missing a warning is logged and the manager is built
    /// without live reload.
    pub fn with_file_watch(mut self, enabled: bool) -> Self {
        self.file_watch = enabled;
        self
    }

    /// Coalesce bursts of file events into one reload.
    ///
    /// The reload happens once no further event arrived for `debounce`. The
    /// default of zero reloads on every modification.
    pub fn with_watch_debounce(mut self, debounce: Duration) -> Self {
        self.watch_debounce = debounce;
        self
    }

    /// Save through a temporary file that replaces the original.
    pub fn with_atomic_save(mut self, enabled: bool) -> Self {
        self.save_options.atomic = enabled;
        self
    }

    /// Comment written at the top of saved files.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.save_options.header = Some(header.into());
        self
    }

    /// Write a timestamp comment when saving (enabled by default).
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.save_options.timestamp = enabled;
        self
    }

    /// Record OpenTelemetry metrics for reloads and saves.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(ConfigMetrics::new(meter));
        self
    }

    /// Build the manager.
    ///
    /// Guarantees the file exists, loads it into `model` (applying the model's
    /// defaults even for an empty file) and starts the watcher if requested.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path exists but is not a readable, writable regular file
    /// - The file cannot be created or read
    /// - The file content cannot be parsed or the model rejects it
    pub fn build<M: ConfigModel>(self, model: M) -> Result<ConfigManager<M>> {
        let file = PropertiesFile::new(self.path);
        file.ensure()?;

        let engine = Engine::new(file, model, self.save_options);
        #[cfg(feature = "metrics")]
        let engine = engine.with_metrics(self.metrics);
        let engine = Arc::new(engine);

        engine.reload(true)?;

        let manager = ConfigManager::from_engine(engine);
        if self.file_watch {
            #[cfg(feature = "file-watch")]
            manager.start_watching(self.watch_debounce);

            #[cfg(not(feature = "file-watch"))]
            tracing::warn!(
                path = %manager.path().display(),
                "File watching requested but the `file-watch` feature is disabled"
            );
        }
        Ok(manager)
    }
}
