//! Reload and save, serialized behind one lock per manager.

use crate::core::ConfigModel;
use crate::error::{ConfigError, Result};
use crate::notify::{SubscriberRegistry, SubscriptionHandle};
use crate::sources::{Properties, PropertiesFile};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[cfg(feature = "metrics")]
use crate::metrics::ConfigMetrics;

/// What a successful reload did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file content differed from the last load and the model was updated.
    Applied,
    /// The file content matched the last load; the model was not touched.
    Unchanged,
}

/// How saved files are written.
#[derive(Debug, Clone)]
pub(crate) struct SaveOptions {
    pub(crate) atomic: bool,
    pub(crate) header: Option<String>,
    pub(crate) timestamp: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            atomic: false,
            header: None,
            timestamp: true,
        }
    }
}

/// Reload and persistence engine shared by a manager and its watcher.
///
/// `model` doubles as the critical section: reload, save and caller
/// mutations all hold its lock for their whole duration. `cache` is only
/// stored while that lock is held.
pub(crate) struct Engine<M> {
    file: PropertiesFile,
    model: Mutex<M>,
    cache: ArcSwap<Properties>,
    subscribers: SubscriberRegistry,
    save_options: SaveOptions,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

impl<M: ConfigModel> Engine<M> {
    pub(crate) fn new(file: PropertiesFile, model: M, save_options: SaveOptions) -> Self {
        Self {
            file,
            model: Mutex::new(model),
            cache: ArcSwap::from_pointee(Properties::new()),
            subscribers: SubscriberRegistry::new(),
            save_options,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: Option<ConfigMetrics>) -> Self {
        if let Some(metrics) = &metrics {
            metrics.update_subscriber_count(0);
            let gauge = metrics.clone();
            self.subscribers = SubscriberRegistry::with_count_observer(move |count| {
                gauge.update_subscriber_count(count as i64);
            });
        }
        self.metrics = metrics;
        self
    }

    pub(crate) fn file(&self) -> &PropertiesFile {
        &self.file
    }

    /// Re-read the file and push it into the model if it changed.
    ///
    /// With `force`, the model is loaded even when the content matches the
    /// cache. On failure neither the model nor the cache is modified.
    pub(crate) fn reload(&self, force: bool) -> Result<ReloadOutcome> {
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(ConfigMetrics::start_reload);

        let result = self.reload_locked(force);

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(Some(_)) => metrics.record_reload_applied(timer),
                Ok(None) => metrics.record_reload_unchanged(timer),
                Err(_) => metrics.record_reload_failure(timer),
            }
        }

        match result {
            Ok(Some(committed)) => {
                info!(path = %self.file.path().display(), "Configuration reloaded");
                self.subscribers.notify_all(&committed);
                Ok(ReloadOutcome::Applied)
            }
            Ok(None) => {
                debug!(path = %self.file.path().display(), "Configuration unchanged, skipping reload");
                Ok(ReloadOutcome::Unchanged)
            }
            Err(e) => {
                error!(
                    path = %self.file.path().display(),
                    error = %e,
                    "Failed to reload configuration. The model keeps its previous values."
                );
                Err(e)
            }
        }
    }

    /// Returns the store committed to the cache, or `None` when the content
    /// was unchanged.
    fn reload_locked(&self, force: bool) -> Result<Option<Arc<Properties>>> {
        let mut model = self.model.lock();

        if !self.file.exists() {
            warn!(path = %self.file.path().display(), "Configuration file missing, recreating it");
            self.file.ensure()?;
        }

        let properties = self.file.read()?;
        if !force && **self.cache.load() == properties {
            return Ok(None);
        }

        let mut staged = model.clone();
        staged.load(&properties)?;
        staged.validate();

        *model = staged;
        let committed = Arc::new(properties);
        self.cache.store(Arc::clone(&committed));
        Ok(Some(committed))
    }

    /// Validate the model and overwrite the file with its properties.
    pub(crate) fn save(&self) -> Result<()> {
        let result = self.save_locked();

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_save(result.is_ok());
        }

        match &result {
            Ok(()) => debug!(path = %self.file.path().display(), "Configuration saved"),
            Err(e) => warn!(
                path = %self.file.path().display(),
                error = %e,
                "Failed to save configuration"
            ),
        }
        result
    }

    fn save_locked(&self) -> Result<()> {
        let mut model = self.model.lock();

        if !self.file.exists() {
            return Err(ConfigError::ConfigFileMissing(self.file.path().to_path_buf()));
        }

        model.validate();
        let contents = self.render(&model.to_properties());
        self.file.write(&contents, self.save_options.atomic)
    }

    fn render(&self, properties: &Properties) -> String {
        let timestamp = self.save_options.timestamp.then(|| {
            chrono::Utc::now()
                .format("%a %b %d %H:%M:%S UTC %Y")
                .to_string()
        });
        let comments: Vec<&str> = self
            .save_options
            .header
            .as_deref()
            .into_iter()
            .chain(timestamp.as_deref())
            .collect();
        properties.to_string_with(&comments)
    }

    pub(crate) fn snapshot(&self) -> Arc<Properties> {
        self.cache.load_full()
    }

    pub(crate) fn with_model<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.model.lock())
    }

    pub(crate) fn with_model_mut<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.model.lock())
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Properties) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }
}
