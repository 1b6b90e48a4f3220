//! The configuration manager binding a model to its backing file.

use crate::core::{ConfigManagerBuilder, ConfigModel, Engine, ReloadOutcome};
use crate::error::Result;
use crate::notify::{SharedWatchState, SubscriptionHandle, WatchState};
use crate::sources::Properties;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "file-watch")]
use crate::notify::ConfigWatcher;
#[cfg(feature = "file-watch")]
use parking_lot::Mutex;
#[cfg(feature = "file-watch")]
use std::time::Duration;
#[cfg(feature = "file-watch")]
use tracing::warn;

/// Binds a [`ConfigModel`] to a properties file.
///
/// Construction guarantees the file exists and loads it into the model.
/// Afterwards the model is reloaded on demand with [`reload`](Self::reload),
/// or automatically when file watching is enabled, and written back with
/// [`save`](Self::save). Reloads, saves and [`update`](Self::update) are
/// mutually exclusive.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_props::prelude::*;
///
/// #[derive(Debug, Clone, Default)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// impl ConfigModel for AppConfig {
///     fn load(&mut self, props: &Properties) -> std::result::Result<(), ValidationError> {
///         self.port = props
///             .get_or("port", "8080")
///             .parse()
///             .map_err(|_| ValidationError::invalid_field("port", "not a port number"))?;
///         Ok(())
///     }
///
///     fn to_properties(&self) -> Properties {
///         [("port", self.port.to_string())].into_iter().collect()
///     }
/// }
///
/// # fn example() -> Result<()> {
/// let manager = ConfigManager::new(AppConfig::default(), "app.properties")?;
/// println!("Port: {}", manager.read(|cfg| cfg.port));
///
/// manager.update(|cfg| cfg.port = 9090);
/// manager.save()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigManager<M> {
    engine: Arc<Engine<M>>,
    watch_state: SharedWatchState,
    #[cfg(feature = "file-watch")]
    watcher: Mutex<Option<ConfigWatcher>>,
}

impl ConfigManager<()> {
    /// Create a builder for a manager bound to `path`.
    pub fn builder(path: impl Into<PathBuf>) -> ConfigManagerBuilder {
        ConfigManagerBuilder::new(path)
    }
}

impl<M: ConfigModel> ConfigManager<M> {
    /// Bind `model` to `path` without watching for changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is unusable, the file cannot be created or
    /// read, or the model rejects its content.
    pub fn new(model: M, path: impl Into<PathBuf>) -> Result<Self> {
        ConfigManagerBuilder::new(path).build(model)
    }

    /// Bind `model` to `path`, optionally reloading it when the file changes.
    ///
    /// Watching needs a tokio runtime. If the watch cannot be set up a warning
    /// is logged and the manager works without live reload.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn open(model: M, path: impl Into<PathBuf>, watch: bool) -> Result<Self> {
        ConfigManagerBuilder::new(path)
            .with_file_watch(watch)
            .build(model)
    }

    pub(crate) fn from_engine(engine: Arc<Engine<M>>) -> Self {
        Self {
            engine,
            watch_state: SharedWatchState::new(),
            #[cfg(feature = "file-watch")]
            watcher: Mutex::new(None),
        }
    }

    #[cfg(feature = "file-watch")]
    pub(crate) fn start_watching(&self, debounce: Duration) {
        let engine = Arc::clone(&self.engine);
        let on_change = move || {
            // Failures are logged by the engine; the previous model stays live.
            let _ = engine.reload(false);
        };

        match ConfigWatcher::spawn(
            self.engine.file().path(),
            debounce,
            self.watch_state.clone(),
            on_change,
        ) {
            Ok(watcher) => *self.watcher.lock() = Some(watcher),
            Err(e) => warn!(
                path = %self.path().display(),
                error = %e,
                "Failed to start file watcher. The file won't be reloaded at runtime."
            ),
        }
    }

    /// The backing file's path.
    pub fn path(&self) -> &Path {
        self.engine.file().path()
    }

    /// Whether the backing file currently exists.
    pub fn exists(&self) -> bool {
        self.engine.file().exists()
    }

    /// Make sure the backing file exists and is usable, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfigPath`](crate::error::ConfigError::InvalidConfigPath)
    /// if the path exists but is not a readable, writable regular file, or an IO
    /// error if it cannot be created.
    pub fn create(&self) -> Result<()> {
        self.engine.file().ensure()
    }

    /// Re-read the backing file and update the model if the content changed.
    ///
    /// A missing file is recreated empty, which loads the model's defaults.
    /// On failure the model and the cached properties keep their previous
    /// values and the error is logged as well as returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the model
    /// rejects the new values.
    pub fn reload(&self) -> Result<ReloadOutcome> {
        self.engine.reload(false)
    }

    /// Write the model's current state to the backing file.
    ///
    /// The model's [`validate`](ConfigModel::validate) hook runs first. The
    /// cached properties are not updated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigFileMissing`](crate::error::ConfigError::ConfigFileMissing)
    /// if the file was deleted (it is not recreated), or an IO error if the
    /// write fails.
    pub fn save(&self) -> Result<()> {
        self.engine.save()
    }

    /// The properties used by the most recent successful reload.
    ///
    /// This is lock-free and never waits for a reload or save in progress.
    pub fn properties(&self) -> Arc<Properties> {
        self.engine.snapshot()
    }

    /// Run `f` with shared access to the model.
    pub fn read<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        self.engine.with_model(f)
    }

    /// A clone of the current model.
    pub fn get(&self) -> M {
        self.read(M::clone)
    }

    /// Run `f` with exclusive access to the model.
    ///
    /// Changes are only persisted by a later [`save`](Self::save), and are
    /// overwritten by the next reload that finds different file content.
    pub fn update<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        self.engine.with_model_mut(f)
    }

    /// Subscribe to reloads that changed the model.
    ///
    /// The callback receives the newly loaded properties and runs after the
    /// manager's lock is released. Dropping the handle unsubscribes.
    pub fn on_reload<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Properties) + Send + Sync + 'static,
    {
        self.engine.subscribe(callback)
    }

    /// The file watcher's lifecycle state.
    pub fn watch_state(&self) -> WatchState {
        self.watch_state.get()
    }

    /// Whether the file watcher is running.
    pub fn is_watching(&self) -> bool {
        self.watch_state() == WatchState::Running
    }

    /// Stop the file watcher and wait for it to close its subscription.
    ///
    /// Does nothing if the manager is not watching. The watcher cannot be
    /// restarted afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatchError`](crate::error::ConfigError::WatchError)
    /// if the subscription could not be closed cleanly.
    #[cfg(feature = "file-watch")]
    pub async fn stop_watching(&self) -> Result<()> {
        let watcher = self.watcher.lock().take();
        match watcher {
            Some(watcher) => watcher.stop().await,
            None => Ok(()),
        }
    }
}
