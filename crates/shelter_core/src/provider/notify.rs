//! In-process change notification registry.
//!
//! # Responsibility
//! - Register observers against a `ResourceId`.
//! - Deliver change signals synchronously after successful writes.
//!
//! # Invariants
//! - Subscription handles are never reused within one notifier.
//! - Observers are invoked outside the registry lock, so an observer may
//!   subscribe, unsubscribe or re-query from inside its callback.

use crate::provider::uri::ResourceId;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Receiver of "data at this identifier may have changed" signals.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, changed: ResourceId);
}

impl<F> ChangeObserver for F
where
    F: Fn(ResourceId) + Send + Sync,
{
    fn on_change(&self, changed: ResourceId) {
        self(changed)
    }
}

/// Opaque handle returned by `subscribe`; pass it to `unsubscribe` to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscription {
    target: ResourceId,
    descendants: bool,
    observer: Arc<dyn ChangeObserver>,
}

/// Observer registry keyed by subscription handle.
#[derive(Default)]
pub struct ChangeNotifier {
    next_handle: AtomicU64,
    subscriptions: Mutex<BTreeMap<u64, Subscription>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for changes at `target`.
    ///
    /// With `descendants`, a collection observer also hears item changes.
    pub fn subscribe(
        &self,
        target: ResourceId,
        descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> SubscriptionHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(
            handle,
            Subscription {
                target,
                descendants,
                observer,
            },
        );
        debug!(
            "event=observer_subscribe module=provider status=ok handle={} target={}",
            handle, target
        );
        SubscriptionHandle(handle)
    }

    /// Removes a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let removed = self.lock().remove(&handle.0).is_some();
        debug!(
            "event=observer_unsubscribe module=provider status=ok handle={} removed={}",
            handle.0, removed
        );
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Signals every observer whose target is affected by `changed`.
    ///
    /// Returns the number of observers invoked.
    pub fn notify_change(&self, changed: ResourceId) -> usize {
        let observers = self
            .lock()
            .values()
            .filter(|sub| sub.target.is_affected_by(changed, sub.descendants))
            .map(|sub| Arc::clone(&sub.observer))
            .collect::<Vec<_>>();

        for observer in &observers {
            observer.on_change(changed);
        }
        debug!(
            "event=change_notify module=provider status=ok target={} observers={}",
            changed,
            observers.len()
        );
        observers.len()
    }

    // Observers never run under this lock; a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
