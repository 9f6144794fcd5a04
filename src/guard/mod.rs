//! Liveness gate between in-flight fetches and an instance's state store.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::state::{StateSink, StateUpdate};

/// Forwards state updates to a sink only while the owning instance is live.
///
/// A guard starts inactive. [`activate`](Self::activate) is called on mount and
/// [`deactivate`](Self::deactivate) on teardown. Clones share the same flag, so
/// a clone captured by a pending fetch observes the teardown.
///
/// The flag is checked before each forward and is not held while the sink
/// runs, so a sink may tear its own instance down.
///
/// # Examples
///
/// ```
/// use fetch_state::guard::LifecycleGuard;
/// use fetch_state::state::{StateStore, StateUpdate};
///
/// let store = StateStore::<u32, ()>::new(false);
/// let guard = LifecycleGuard::new(store.sink());
///
/// guard.activate();
/// assert!(guard.emit(StateUpdate::Loaded(1)));
///
/// guard.deactivate();
/// assert!(!guard.emit(StateUpdate::Loaded(2)));
/// assert_eq!(store.snapshot().payload(), Some(&1));
/// ```
pub struct LifecycleGuard<T, E> {
    live: Arc<AtomicBool>,
    sink: StateSink<T, E>,
}

impl<T, E> LifecycleGuard<T, E> {
    /// Wraps `sink` in an inactive guard.
    pub fn new(sink: StateSink<T, E>) -> Self {
        Self {
            live: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    pub fn activate(&self) {
        self.live.store(true, Ordering::SeqCst);
    }

    /// Idempotent.
    pub fn deactivate(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Forwards `update` if live. Returns whether it was delivered.
    pub fn emit(&self, update: StateUpdate<T, E>) -> bool {
        if self.is_live() {
            (self.sink)(update);
            true
        } else {
            trace!("state update dropped after teardown");
            false
        }
    }
}

impl<T, E> Clone for LifecycleGuard<T, E> {
    fn clone(&self) -> Self {
        Self {
            live: Arc::clone(&self.live),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<T, E> fmt::Debug for LifecycleGuard<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleGuard")
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (StateSink<u32, ()>, Arc<Mutex<Vec<StateUpdate<u32, ()>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: StateSink<u32, ()> = Arc::new(move |u| sink_seen.lock().unwrap().push(u));
        (sink, seen)
    }

    #[test]
    fn starts_inactive() {
        let (sink, seen) = recording();
        let guard = LifecycleGuard::new(sink);
        assert!(!guard.is_live());
        assert!(!guard.emit(StateUpdate::Loading));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn deactivate_is_idempotent() {
        let (sink, seen) = recording();
        let guard = LifecycleGuard::new(sink);
        guard.activate();
        guard.emit(StateUpdate::Loading);
        guard.deactivate();
        guard.deactivate();
        guard.emit(StateUpdate::Loaded(1));
        assert_eq!(*seen.lock().unwrap(), vec![StateUpdate::Loading]);
    }

    #[test]
    fn clones_observe_teardown() {
        let (sink, seen) = recording();
        let guard = LifecycleGuard::new(sink);
        guard.activate();
        let in_flight = guard.clone();
        guard.deactivate();
        assert!(!in_flight.is_live());
        assert!(!in_flight.emit(StateUpdate::Failed(())));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn sink_may_tear_down_its_own_guard() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<LifecycleGuard<u32, ()>>>> = Arc::new(Mutex::new(None));
        let log = Arc::clone(&seen);
        let owner = Arc::clone(&slot);
        let sink: StateSink<u32, ()> = Arc::new(move |u| {
            let failed = matches!(u, StateUpdate::Failed(_));
            log.lock().unwrap().push(u);
            if failed {
                if let Some(guard) = owner.lock().unwrap().as_ref() {
                    guard.deactivate();
                }
            }
        });
        let guard = LifecycleGuard::new(sink);
        *slot.lock().unwrap() = Some(guard.clone());
        guard.activate();

        assert!(guard.emit(StateUpdate::Failed(())));
        assert!(!guard.is_live());
        assert!(!guard.emit(StateUpdate::Loaded(1)));
        assert_eq!(*seen.lock().unwrap(), vec![StateUpdate::Failed(())]);
    }
}
