//! The generic observable state container.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Inner<S> {
    state: Mutex<S>,
    listeners: Mutex<Vec<(u64, Listener<S>)>>,
    next_id: AtomicU64,
}

/// A minimal observable container holding one typed state value.
///
/// Subscribers are notified synchronously, in subscription order, on
/// every change. Cloning the store yields another handle to the same
/// shared state.
pub struct StateStore<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for StateStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + Send + 'static> StateStore<S> {
    /// Create a store with the given initial state.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current snapshot of the state.
    pub fn get(&self) -> S {
        self.inner.state.lock().unwrap().clone()
    }

    /// Register a listener and immediately invoke it once with the
    /// current state, so late subscribers are never stale.
    ///
    /// The returned [`Subscription`] removes the listener when
    /// unsubscribed or dropped. Listeners may subscribe or unsubscribe
    /// from within a callback; a listener removed while a notification
    /// pass is in flight may still receive that pass.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let listener: Listener<S> = Arc::new(listener);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .listeners
            .lock()
            .unwrap()
            .push((id, listener.clone()));

        let current = self.get();
        invoke_listener(&listener, &current);

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = Weak::upgrade(&weak) {
                inner.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Replace the state and notify all subscribers.
    pub fn replace(&self, next: S) {
        {
            let mut state = self.inner.state.lock().unwrap();
            *state = next;
        }
        self.notify();
    }

    /// Mutate the state in place and notify all subscribers.
    ///
    /// Every call notifies; there is no change detection or batching.
    pub fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut S),
    {
        {
            let mut state = self.inner.state.lock().unwrap();
            mutate(&mut state);
        }
        self.notify();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().unwrap().len()
    }

    /// Deliver the current state to a snapshot of the listener list.
    ///
    /// Neither lock is held while listeners run, so callbacks are free
    /// to call back into the store.
    fn notify(&self) {
        let state = self.get();
        let listeners: Vec<Listener<S>> = self
            .inner
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in listeners {
            invoke_listener(&listener, &state);
        }
    }
}

/// Invoke one listener, isolating a panic so the remaining listeners
/// still receive the notification.
fn invoke_listener<S>(listener: &Listener<S>, state: &S) {
    let result = catch_unwind(AssertUnwindSafe(|| listener(state)));
    if result.is_err() {
        tracing::error!("state listener panicked during notification");
    }
}

/// Capability that removes a listener from its store.
///
/// Unsubscribing more than once is a no-op. Dropping the subscription
/// unsubscribes as well.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
    active: AtomicBool,
}

impl Subscription {
    fn new<F>(cancel: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            cancel: Box::new(cancel),
            active: AtomicBool::new(true),
        }
    }

    /// Remove the listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            (self.cancel)();
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    struct Counter {
        value: i64,
    }

    #[test]
    fn subscribe_delivers_current_state_immediately() {
        let store = StateStore::new(Counter { value: 7 });
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |s: &Counter| {
            seen_clone.lock().unwrap().push(s.value);
        });

        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn every_update_notifies_with_full_state() {
        let store = StateStore::new(Counter::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |s: &Counter| {
            seen_clone.lock().unwrap().push(s.value);
        });

        store.update(|s| s.value = 1);
        store.update(|s| s.value = 1); // no dedup: still notifies
        store.replace(Counter { value: 2 });

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn listeners_notified_in_subscription_order() {
        let store = StateStore::new(Counter::default());
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _a = store.subscribe(move |_: &Counter| order_a.lock().unwrap().push("a"));
        let order_b = order.clone();
        let _b = store.subscribe(move |_: &Counter| order_b.lock().unwrap().push("b"));

        order.lock().unwrap().clear();
        store.update(|s| s.value += 1);

        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let store = StateStore::new(Counter::default());
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let sub = store.subscribe(move |_: &Counter| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.listener_count(), 0);

        store.update(|s| s.value += 1);
        assert_eq!(count.load(Ordering::SeqCst), 1); // only the immediate delivery
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = StateStore::new(Counter::default());

        {
            let _sub = store.subscribe(|_: &Counter| {});
            assert_eq!(store.listener_count(), 1);
        }

        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn unsubscribe_during_notification_keeps_other_listeners() {
        let store = StateStore::new(Counter::default());

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();
        let first = store.subscribe(move |_: &Counter| {
            // Retire the first listener from inside a notification pass.
            if let Some(sub) = slot_clone.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(first);

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let _second = store.subscribe(move |_: &Counter| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        count.store(0, Ordering::SeqCst);
        store.update(|s| s.value += 1);
        store.update(|s| s.value += 1);

        // The second listener saw both passes despite the mid-pass removal.
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn subscribing_from_within_a_listener_does_not_deadlock() {
        let store = StateStore::new(Counter::default());
        let extra: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));

        let store_clone = store.clone();
        let extra_clone = extra.clone();
        let _sub = store.subscribe(move |s: &Counter| {
            if s.value == 1 {
                let sub = store_clone.subscribe(|_: &Counter| {});
                extra_clone.lock().unwrap().push(sub);
            }
        });

        store.update(|s| s.value = 1);
        assert_eq!(store.listener_count(), 2);
    }

    #[test]
    fn panicking_listener_does_not_break_delivery() {
        let store = StateStore::new(Counter::default());

        let _bad = store.subscribe(|s: &Counter| {
            if s.value > 0 {
                panic!("listener failure");
            }
        });

        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let _good = store.subscribe(move |_: &Counter| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        count.store(0, Ordering::SeqCst);
        store.update(|s| s.value = 1);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn get_returns_snapshot_after_updates() {
        let store = StateStore::new(Counter::default());
        store.update(|s| s.value = 42);
        assert_eq!(store.get(), Counter { value: 42 });
    }
}
