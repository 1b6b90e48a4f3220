//! Background task that reloads the configuration when its file is modified.

use super::state::{SharedWatchState, WatchState};
use crate::error::{ConfigError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Owned handle to a running file watcher.
///
/// The watcher subscribes to modify events on the directory containing the
/// watched file and runs a callback whenever the file itself is modified.
/// Dropping the handle cancels the task; [`stop`](ConfigWatcher::stop) also
/// waits for it to finish.
pub(crate) struct ConfigWatcher {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl ConfigWatcher {
    /// Start watching `path`, calling `on_change` for every modification.
    ///
    /// `on_change` runs on tokio's blocking pool. With a non-zero
    /// `debounce_duration`, a burst of events is coalesced into one call made
    /// once no modification has arrived for that long.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatchError`] if no tokio runtime is available or
    /// the filesystem subscription cannot be created. `state` is left at
    /// [`WatchState::Stopped`] in that case.
    pub(crate) fn spawn<F>(
        path: &Path,
        debounce_duration: Duration,
        state: SharedWatchState,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        state.set(WatchState::Starting);
        let result = Self::try_spawn(path, debounce_duration, state.clone(), on_change);
        if result.is_err() {
            state.set(WatchState::Stopped);
        }
        result
    }

    fn try_spawn<F>(
        path: &Path,
        debounce_duration: Duration,
        state: SharedWatchState,
        on_change: F,
    ) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ConfigError::WatchError(format!("No tokio runtime available: {}", e)))?;

        let subscription = Subscription::open(path)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let subscription = subscription.listen(event_tx)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let on_change = Arc::new(on_change);

        state.set(WatchState::Running);
        let task = runtime.spawn(async move {
            let result = watch_loop(
                subscription,
                event_rx,
                shutdown_rx,
                debounce_duration,
                on_change,
            )
            .await;
            state.set(WatchState::Closed);
            if let Err(e) = &result {
                error!(error = %e, "File watcher terminated with an error");
            }
            result
        });

        Ok(Self {
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Cancel the task and wait for it to close its subscription.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatchError`] if the subscription could not be
    /// closed cleanly or the task panicked.
    pub(crate) async fn stop(mut self) -> Result<()> {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already have exited on its own.
            let _ = shutdown.send(());
        }
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(ConfigError::WatchError(format!(
                "File watcher task failed: {}",
                e
            ))),
        }
    }
}

/// The OS-level watch registration; closed by consuming it.
struct Subscription {
    watcher: Option<RecommendedWatcher>,
    dir: PathBuf,
    file_name: OsString,
}

impl Subscription {
    fn open(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| {
                ConfigError::WatchError(format!("Path has no file name: {}", path.display()))
            })?
            .to_os_string();

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let dir = parent.canonicalize().map_err(|e| {
            ConfigError::WatchError(format!(
                "Failed to resolve directory {}: {}",
                parent.display(),
                e
            ))
        })?;

        Ok(Self {
            watcher: None,
            dir,
            file_name,
        })
    }

    fn listen(mut self, tx: mpsc::UnboundedSender<notify::Result<Event>>) -> Result<Self> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the task is shutting down.
            let _ = tx.send(res);
        })
        .map_err(|e| ConfigError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&self.dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::WatchError(format!(
                    "Failed to watch {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;

        self.watcher = Some(watcher);
        Ok(self)
    }

    fn is_modification(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    fn close(mut self) -> Result<()> {
        let Some(mut watcher) = self.watcher.take() else {
            return Ok(());
        };
        watcher.unwatch(&self.dir).map_err(|e| {
            ConfigError::WatchError(format!(
                "Failed to close watch on {}: {}",
                self.dir.display(),
                e
            ))
        })?;
        debug!(dir = %self.dir.display(), "Closed file watch subscription");
        Ok(())
    }
}

async fn watch_loop(
    subscription: Subscription,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    mut shutdown: oneshot::Receiver<()>,
    debounce: Duration,
    on_change: Arc<dyn Fn() + Send + Sync>,
) -> Result<()> {
    'watch: loop {
        let event = tokio::select! {
            biased;
            _ = &mut shutdown => {
                debug!("File watcher cancelled");
                break 'watch;
            }
            event = events.recv() => event,
        };

        let event = match event {
            Some(Ok(event)) => event,
            Some(Err(e)) => {
                warn!(error = %e, "File watcher reported an error");
                continue;
            }
            None => {
                warn!("File watcher event stream ended");
                break;
            }
        };

        if !subscription.is_modification(&event) {
            continue;
        }
        debug!(kind = ?event.kind, "Configuration file modified");

        if !debounce.is_zero() {
            // Every further modification pushes the deadline back.
            let quiet = tokio::time::sleep(debounce);
            tokio::pin!(quiet);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        debug!("File watcher cancelled");
                        break 'watch;
                    }
                    _ = &mut quiet => break,
                    event = events.recv() => match event {
                        Some(Ok(event)) if subscription.is_modification(&event) => {
                            quiet.as_mut().reset(Instant::now() + debounce);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => warn!(error = %e, "File watcher reported an error"),
                        None => break,
                    },
                }
            }
        }

        let callback = Arc::clone(&on_change);
        if let Err(e) = tokio::task::spawn_blocking(move || callback()).await {
            error!(error = %e, "Reload triggered by file watcher panicked");
        }
    }

    subscription.close()
}
