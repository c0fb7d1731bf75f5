//! Observable value cells.
//!
//! `Writable<T>` holds a value and pushes every update to its subscribers.
//! Subscribing returns a `Subscription`; dropping it (or calling
//! `unsubscribe`) removes the subscriber, so listener lifetime is always
//! bounded by the handle that owns it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Lock a mutex, recovering the data if a subscriber panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a registered listener. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription immediately unregisters the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unregister the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<(u64, Subscriber<T>)>>,
    next_id: AtomicU64,
}

/// A value cell that notifies subscribers on every `set`.
pub struct Writable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + 'static> Writable<T> {
    pub fn new(value: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(value),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        lock(&self.shared.value).clone()
    }

    /// Replace the value and notify every subscriber, even if the new value
    /// equals the old one.
    pub fn set(&self, value: T) {
        {
            let mut current = lock(&self.shared.value);
            *current = value.clone();
        }
        self.notify(&value);
    }

    /// Compute a new value from the current one and notify as `set` does.
    /// The read and write happen under one lock, so concurrent updates are
    /// not lost. `f` must not touch this store.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = {
            let mut current = lock(&self.shared.value);
            let next = f(&current);
            *current = next.clone();
            next
        };
        self.notify(&next);
    }

    /// Register a subscriber. It is called once with the current value, then
    /// on every subsequent `set`, in registration order.
    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let subscriber: Subscriber<T> = Arc::new(subscriber);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.subscribers).push((id, Arc::clone(&subscriber)));

        subscriber(&self.get());

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                lock(&shared.subscribers).retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    /// Read-only view sharing this cell.
    pub fn readable(&self) -> Readable<T> {
        Readable {
            inner: self.clone(),
        }
    }

    fn notify(&self, value: &T) {
        // Snapshot so subscribers can subscribe/unsubscribe re-entrantly.
        let subscribers: Vec<Subscriber<T>> = lock(&self.shared.subscribers)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(value);
        }
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writable")
            .field("value", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Read-only view of a `Writable`.
pub struct Readable<T> {
    inner: Writable<T>,
}

impl<T> Clone for Readable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Readable<T> {
    pub fn get(&self) -> T {
        self.inner.get()
    }

    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.inner.subscribe(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for Readable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Readable").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: &T| sink.lock().unwrap().push(value.clone()))
    }

    #[test]
    fn test_get_returns_initial_value() {
        let store = Writable::new(5);
        assert_eq!(store.get(), 5);
    }

    #[test]
    fn test_subscribe_receives_current_value_first() {
        let store = Writable::new("sq".to_string());
        let (seen, subscriber) = recorder::<String>();
        let _sub = store.subscribe(subscriber);

        assert_eq!(*seen.lock().unwrap(), vec!["sq".to_string()]);
    }

    #[test]
    fn test_set_notifies_subscribers() {
        let store = Writable::new(false);
        let (seen, subscriber) = recorder::<bool>();
        let _sub = store.subscribe(subscriber);

        store.set(true);
        store.set(true);

        assert_eq!(*seen.lock().unwrap(), vec![false, true, true]);
        assert!(store.get());
    }

    #[test]
    fn test_update_derives_from_current_value() {
        let store = Writable::new(1);
        store.update(|n| n + 41);
        assert_eq!(store.get(), 42);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Writable::new(0);
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.update(|n| n + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(store.get(), 2000);
    }

    #[test]
    fn test_subscribers_fire_in_registration_order() {
        let store = Writable::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let _a = store.subscribe(move |_| first.lock().unwrap().push("a"));
        let second = Arc::clone(&order);
        let _b = store.subscribe(move |_| second.lock().unwrap().push("b"));

        order.lock().unwrap().clear();
        store.set(1);

        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = Writable::new(0);
        let (seen, subscriber) = recorder::<i32>();
        let sub = store.subscribe(subscriber);
        assert_eq!(store.subscriber_count(), 1);

        sub.unsubscribe();
        store.set(7);

        assert_eq!(store.subscriber_count(), 0);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = Writable::new(0);
        {
            let _sub = store.subscribe(|_| {});
            assert_eq!(store.subscriber_count(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_store_is_harmless() {
        let store = Writable::new(0);
        let sub = store.subscribe(|_| {});
        drop(store);
        sub.unsubscribe();
    }

    #[test]
    fn test_readable_shares_value() {
        let store = Writable::new(1);
        let view = store.readable();
        let (seen, subscriber) = recorder::<i32>();
        let _sub = view.subscribe(subscriber);

        store.set(2);

        assert_eq!(view.get(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_subscriber_may_read_store_during_notification() {
        let store = Writable::new(0);
        let inner = store.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |_| sink.lock().unwrap().push(inner.get()));

        store.set(3);

        assert_eq!(*seen.lock().unwrap(), vec![0, 3]);
    }
}
