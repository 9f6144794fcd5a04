//! Per-instance fetch state and the updates that drive it.
//!
//! The orchestrator never writes state directly. It emits [`StateUpdate`]s into
//! a [`StateSink`]; whatever store the binding layer keeps applies them with
//! [`RequestState::apply`]. [`StateStore`] is a ready-made store built on a
//! `tokio::sync::watch` channel.

use std::sync::Arc;

use tokio::sync::watch;

/// A single emission from the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate<T, E> {
    /// Partial update: a network call started. Payload and error are left as-is.
    Loading,
    /// Settled with a payload, either fresh or from the cache.
    Loaded(T),
    /// Settled with the network function's failure, carried verbatim.
    Failed(E),
}

impl<T, E> StateUpdate<T, E> {
    /// `true` for the updates that end an invocation.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Receives every update an orchestrator produces.
pub type StateSink<T, E> = Arc<dyn Fn(StateUpdate<T, E>) + Send + Sync>;

/// Loading / error / payload state for one mounted instance.
///
/// At most one of `payload` and `error` is present, and `is_loading` and
/// `is_error` are never both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState<T, E> {
    is_loading: bool,
    is_error: bool,
    payload: Option<T>,
    error: Option<E>,
}

impl<T, E> Default for RequestState<T, E> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<T, E> RequestState<T, E> {
    /// Empty state. `is_loading` starts set when a fetch is scheduled on mount.
    pub fn new(is_loading: bool) -> Self {
        Self {
            is_loading,
            is_error: false,
            payload: None,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Merges `update` into the current state.
    pub fn apply(&mut self, update: StateUpdate<T, E>) {
        match update {
            StateUpdate::Loading => {
                self.is_loading = true;
                self.is_error = false;
            }
            StateUpdate::Loaded(payload) => {
                self.is_loading = false;
                self.is_error = false;
                self.payload = Some(payload);
                self.error = None;
            }
            StateUpdate::Failed(error) => {
                self.is_loading = false;
                self.is_error = true;
                self.payload = None;
                self.error = Some(error);
            }
        }
    }
}

/// A watch-channel backed state store.
///
/// Cloning shares the same underlying state.
///
/// # Examples
///
/// ```
/// use fetch_state::state::{StateStore, StateUpdate};
///
/// let store = StateStore::<u32, String>::new(false);
/// let sink = store.sink();
///
/// sink(StateUpdate::Loading);
/// assert!(store.snapshot().is_loading());
///
/// sink(StateUpdate::Loaded(7));
/// assert_eq!(store.snapshot().payload(), Some(&7));
/// ```
pub struct StateStore<T, E> {
    tx: Arc<watch::Sender<RequestState<T, E>>>,
}

impl<T, E> Clone for StateStore<T, E> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T, E> StateStore<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(is_loading: bool) -> Self {
        Self::from_state(RequestState::new(is_loading))
    }

    pub fn from_state(state: RequestState<T, E>) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx: Arc::new(tx) }
    }

    /// Applies `update` and notifies subscribers.
    pub fn apply(&self, update: StateUpdate<T, E>) {
        self.tx.send_modify(|state| state.apply(update));
    }

    /// Returns a sink that applies every update to this store.
    pub fn sink(&self) -> StateSink<T, E> {
        let store = self.clone();
        Arc::new(move |update| store.apply(update))
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T, E>> {
        self.tx.subscribe()
    }
}

impl<T: Clone, E: Clone> StateStore<T, E> {
    /// Clones out the current state.
    pub fn snapshot(&self) -> RequestState<T, E> {
        self.tx.borrow().clone()
    }
}
