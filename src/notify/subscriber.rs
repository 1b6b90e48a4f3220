//! Subscriber-based notifications for applied reloads.

use crate::sources::Properties;
use parking_lot::RwLock;
use std::sync::Arc;

type Callback = Arc<dyn Fn(&Properties) + Send + Sync>;
type CountObserver = Arc<dyn Fn(usize) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
pub struct SubscriptionHandle {
    id: usize,
    registry: Arc<RwLock<SubscriberRegistryInner>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        let id = self.id;
        let mut inner = self.registry.write();
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
        let observed = inner.observed_count();
        drop(inner);

        if let Some((observer, count)) = observed {
            observer(count);
        }
    }
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: Vec<(usize, Callback)>,
    next_id: usize,
    on_count_change: Option<CountObserver>,
}

impl SubscriberRegistryInner {
    fn observed_count(&self) -> Option<(CountObserver, usize)> {
        self.on_count_change
            .as_ref()
            .map(|observer| (Arc::clone(observer), self.subscribers.len()))
    }
}

/// Registry for callbacks invoked after a reload changed the model.
///
/// # Examples
///
/// ```rust
/// use hotswap_props::notify::SubscriberRegistry;
/// use hotswap_props::sources::Properties;
///
/// let registry = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|props: &Properties| {
///     println!("Config changed, {} keys", props.len());
/// });
///
/// registry.notify_all(&Properties::new());
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry {
    inner: Arc<RwLock<SubscriberRegistryInner>>,
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a registry that reports its subscriber count after every
    /// subscribe and unsubscribe.
    ///
    /// `observer` runs outside the registry lock.
    pub fn with_count_observer<F>(observer: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        Self::build(Some(Arc::new(observer)))
    }

    fn build(on_count_change: Option<CountObserver>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
                on_count_change,
            })),
        }
    }

    /// Register `callback`; it receives the newly loaded properties.
    ///
    /// Returns a handle that unsubscribes when dropped.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&Properties) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        let observed = inner.observed_count();
        drop(inner);

        if let Some((observer, count)) = observed {
            observer(count);
        }

        SubscriptionHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Call every subscriber in subscription order.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or drop handles itself.
    pub fn notify_all(&self, properties: &Properties) {
        let callbacks: Vec<Callback> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(properties);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_and_notify() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let _handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&Properties::new());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.notify_all(&Properties::new());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_receives_properties() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(parking_lot::Mutex::new(None));

        let seen_clone = Arc::clone(&seen);
        let _handle = registry.subscribe(move |props| {
            *seen_clone.lock() = props.get("name").map(str::to_string);
        });

        let props: Properties = [("name", "Bob")].into_iter().collect();
        registry.notify_all(&props);
        assert_eq!(seen.lock().as_deref(), Some("Bob"));
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        let handle = registry.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&Properties::new());
        drop(handle);
        registry.notify_all(&Properties::new());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_count() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.subscriber_count(), 0);

        let handle1 = registry.subscribe(|_| {});
        let _handle2 = registry.subscribe(|_| {});
        assert_eq!(registry.subscriber_count(), 2);

        drop(handle1);
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn test_count_observer_tracks_subscriptions() {
        let counts = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let counts_clone = Arc::clone(&counts);
        let registry = SubscriberRegistry::with_count_observer(move |count| {
            counts_clone.lock().push(count);
        });

        let handle1 = registry.subscribe(|_| {});
        let handle2 = registry.subscribe(|_| {});
        drop(handle1);
        drop(handle2);

        assert_eq!(*counts.lock(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_callback_may_subscribe() {
        let registry = SubscriberRegistry::new();
        let nested = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let registry_clone = registry.clone();
        let nested_clone = Arc::clone(&nested);
        let _handle = registry.subscribe(move |_| {
            nested_clone.lock().push(registry_clone.subscribe(|_| {}));
        });

        registry.notify_all(&Properties::new());
        assert_eq!(registry.subscriber_count(), 2);
    }
}
