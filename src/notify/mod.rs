//! Configuration change notification system.
//!
//! Provides file watching and subscriber-based notifications when configuration is reloaded.

mod state;
pub mod subscriber;

#[cfg(feature = "file-watch")]
mod watcher;

pub(crate) use state::SharedWatchState;
pub use state::WatchState;
pub use subscriber::{SubscriberRegistry, SubscriptionHandle};

#[cfg(feature = "file-watch")]
pub(crate) use watcher::ConfigWatcher;
