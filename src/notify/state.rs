//! Lifecycle state of the file watcher.

use parking_lot::Mutex;
use std::sync::Arc;

/// Where a manager's file watcher is in its lifecycle.
///
/// The watcher moves `Stopped → Starting → Running → Closed` and never
/// restarts. A failed start falls back to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not watching: never requested, or the subscription could not be set up.
    Stopped,
    /// Subscribing to filesystem events.
    Starting,
    /// The background task is waiting for events.
    Running,
    /// The task has ended and its subscription is closed.
    Closed,
}

/// State cell shared between a manager and its watcher task.
#[derive(Debug, Clone)]
pub(crate) struct SharedWatchState(Arc<Mutex<WatchState>>);

impl SharedWatchState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(WatchState::Stopped)))
    }

    pub(crate) fn get(&self) -> WatchState {
        *self.0.lock()
    }

    #[cfg_attr(not(feature = "file-watch"), allow(dead_code))]
    pub(crate) fn set(&self, state: WatchState) {
        *self.0.lock() = state;
    }
}
