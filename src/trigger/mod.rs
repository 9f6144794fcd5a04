//! Lifecycle-driven fetch and cancel decisions for one mounted instance.
//!
//! A [`TriggerPolicy`] moves through three phases:
//!
//! ```text
//! Uninitialized --init--> Active --dispose--> Disposed
//!                          |  ^
//!                          +--+ inputs changed
//! ```
//!
//! The binding layer delivers the events; it alone decides whether two input
//! snapshots differ. Fetches are returned as [`Pending`] futures that the
//! caller awaits or spawns; the policy never drives them itself.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::cache::CacheResult;
use crate::guard::LifecycleGuard;
use crate::http::RequestData;
use crate::orchestrator::{BoxFuture, CancelFn, FetchOrchestrator};
use crate::state::StateSink;

/// Decides whether an input change warrants an action.
pub type InputsPredicate<I> = Arc<dyn Fn(&I, &I) -> bool + Send + Sync>;

/// Teardown callback with no observable result.
pub type CleanupFn = Arc<dyn Fn() + Send + Sync>;

/// An in-flight fetch cycle, owned by whoever receives it.
pub type Pending = BoxFuture<'static, CacheResult<()>>;

/// Lifecycle phase of a mounted instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    Disposed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Disposed => "disposed",
        })
    }
}

/// A lifecycle event delivered in the wrong phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot {event} an instance that is {phase}")]
    InvalidTransition { event: &'static str, phase: Phase },
}

/// Trigger settings shared by every instance of one definition.
pub struct TriggerConfig<I, P> {
    pub call_on_mount: bool,
    pub call_on_props: InputsPredicate<I>,
    pub cancel_on_props: InputsPredicate<I>,
    pub cancel_on_unmount: bool,
    pub delete_cache_on_unmount: CleanupFn,
    pub cancel: CancelFn<P>,
}

impl<I, P> fmt::Debug for TriggerConfig<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerConfig")
            .field("call_on_mount", &self.call_on_mount)
            .field("cancel_on_unmount", &self.cancel_on_unmount)
            .finish_non_exhaustive()
    }
}

/// Per-instance state machine wiring lifecycle events to the orchestrator.
///
/// Owns the instance's [`LifecycleGuard`] and its current inputs. Every fetch
/// it starts emits through the guard, so results that land after
/// [`dispose`](Self::dispose) are dropped.
pub struct TriggerPolicy<I, F, P, T, E> {
    orchestrator: Arc<FetchOrchestrator<I, F, P, T, E>>,
    config: Arc<TriggerConfig<I, P>>,
    guard: LifecycleGuard<T, E>,
    inputs: I,
    phase: Phase,
}

impl<I, F, P, T, E> TriggerPolicy<I, F, P, T, E> {
    pub fn new(
        orchestrator: Arc<FetchOrchestrator<I, F, P, T, E>>,
        config: Arc<TriggerConfig<I, P>>,
        inputs: I,
        sink: StateSink<T, E>,
    ) -> Self {
        Self {
            orchestrator,
            config,
            guard: LifecycleGuard::new(sink),
            inputs,
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn inputs(&self) -> &I {
        &self.inputs
    }

    pub fn data_key(&self) -> &str {
        self.orchestrator.data_key()
    }

    pub fn guard(&self) -> &LifecycleGuard<T, E> {
        &self.guard
    }

    /// Forwards a request built from the current inputs and `params` to the
    /// cancel callback. Works in any phase and whether or not a fetch is in
    /// flight; in-flight futures are not aborted.
    pub fn cancel(&self, params: Option<&F>) {
        let request = self.orchestrator.request_data(&self.inputs, params);
        self.send_cancel(&request);
    }

    /// Tears the instance down.
    ///
    /// Deactivates the guard, cancels the current request when
    /// `cancel_on_unmount` is set, and always runs `delete_cache_on_unmount`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the instance is active.
    pub fn dispose(&mut self) -> Result<(), LifecycleError> {
        self.expect_phase(Phase::Active, "dispose")?;
        self.phase = Phase::Disposed;
        self.guard.deactivate();
        debug!(data_key = %self.data_key(), "instance disposed");

        if self.config.cancel_on_unmount {
            self.cancel(None);
        }
        (self.config.delete_cache_on_unmount)();
        Ok(())
    }

    fn send_cancel(&self, request: &RequestData<P>) {
        trace!(data_key = %self.data_key(), url = %request.url, "cancel requested");
        (self.config.cancel)(request);
    }

    fn expect_phase(&self, expected: Phase, event: &'static str) -> Result<(), LifecycleError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                event,
                phase: self.phase,
            })
        }
    }
}

impl<I, F, P, T, E> TriggerPolicy<I, F, P, T, E>
where
    I: Clone + Send + Sync + 'static,
    F: Send + Sync + 'static,
    P: Clone + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Mounts the instance: activates the guard and, when `call_on_mount` is
    /// set, starts a fetch with the current inputs.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the instance is uninitialized.
    pub fn init(&mut self) -> Result<Option<Pending>, LifecycleError> {
        self.expect_phase(Phase::Uninitialized, "init")?;
        self.phase = Phase::Active;
        self.guard.activate();
        debug!(data_key = %self.data_key(), "instance initialized");

        Ok(self.config.call_on_mount.then(|| self.fetch(None)))
    }

    /// Handles an input change the binding layer has already detected.
    ///
    /// `call_on_props` and `cancel_on_props` are both evaluated against the
    /// previous and next inputs; either, both, or neither may fire. The cancel
    /// request is built from `next` without call parameters.
    ///
    /// The returned [`Pending`] is lazy. When both predicates fire, `cancel`
    /// has already been called by the time this method returns, and the
    /// refetch reaches the network only once the caller polls or spawns the
    /// future. Cancel callbacks therefore never see the refetch in flight.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the instance is active. The
    /// inputs are left untouched in that case.
    pub fn on_inputs_changed(&mut self, next: I) -> Result<Option<Pending>, LifecycleError> {
        self.expect_phase(Phase::Active, "change inputs of")?;
        let prev = std::mem::replace(&mut self.inputs, next);

        let refetch = (self.config.call_on_props)(&prev, &self.inputs);
        let pending = refetch.then(|| self.fetch(None));

        if (self.config.cancel_on_props)(&prev, &self.inputs) {
            self.cancel(None);
        }

        trace!(data_key = %self.data_key(), refetch, "inputs changed");
        Ok(pending)
    }

    /// Starts a fetch with the current inputs and `params`.
    ///
    /// Callable in any phase; once the instance is disposed the fetch still
    /// runs but its emissions are dropped.
    pub fn fetch(&self, params: Option<F>) -> Pending {
        let orchestrator = Arc::clone(&self.orchestrator);
        let guard = self.guard.clone();
        let inputs = self.inputs.clone();

        Box::pin(async move {
            let emit = move |update| {
                guard.emit(update);
            };
            orchestrator.invoke(emit, &inputs, params.as_ref()).await
        })
    }
}

impl<I, F, P, T, E> fmt::Debug for TriggerPolicy<I, F, P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerPolicy")
            .field("data_key", &self.data_key())
            .field("phase", &self.phase)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
