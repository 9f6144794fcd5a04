//! Entry point tying a network function to request definitions.
//!
//! ```text
//! RequestClient ──define(config)──▶ RequestDefinition ──mount(inputs, sink)──▶ TriggerPolicy
//!   fetch, cancel                    orchestrator (shared)                    guard, inputs
//! ```
//!
//! A client is created once per transport. Each definition builds its
//! orchestrator once; every mounted instance gets its own policy and guard.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigError, RequestConfig};
use crate::descriptor::RequestDescriptor;
use crate::http::{Method, RequestData};
use crate::orchestrator::{CancelFn, FetchFn, FetchOrchestrator, IntoFetch};
use crate::state::{RequestState, StateSink};
use crate::trigger::{TriggerConfig, TriggerPolicy};

/// A network function plus its optional cancellation callback.
///
/// Type parameters: `P` request payload, `T` response payload, `E` network error.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use fetch_state::client::RequestClient;
/// use fetch_state::config::RequestConfig;
/// use fetch_state::http::RequestData;
/// use fetch_state::state::StateStore;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RequestClient::new(|request: RequestData<()>| async move {
///     Ok::<_, String>(format!("fetched {}", request.url))
/// })
/// .with_cancel(|request: &RequestData<()>| println!("cancel {}", request.url));
///
/// let definition = client.define(
///     RequestConfig::<u64, (), (), String>::new(|id: &u64, _: Option<&()>| format!("/users/{id}"))
///         .data_key("user"),
/// )?;
///
/// let store = StateStore::from_state(definition.initial_state());
/// let mut instance = definition.mount(42, store.sink());
/// if let Some(pending) = instance.init()? {
///     tokio::spawn(pending);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestClient<P, T, E> {
    fetch: FetchFn<P, T, E>,
    cancel: CancelFn<P>,
}

impl<P, T, E> RequestClient<P, T, E> {
    /// Creates a client with a no-op cancel callback.
    pub fn new(fetch: impl IntoFetch<P, T, E>) -> Self {
        Self {
            fetch: Arc::new(fetch),
            cancel: Arc::new(|_: &RequestData<P>| {}),
        }
    }

    #[must_use]
    pub fn with_cancel<C>(mut self, cancel: C) -> Self
    where
        C: Fn(&RequestData<P>) + Send + Sync + 'static,
    {
        self.cancel = Arc::new(cancel);
        self
    }

    /// Validates `config` and builds its shared orchestrator.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyDataKey`] — the data key is empty.
    /// - [`ConfigError::Method`] — the method is not a valid HTTP token.
    pub fn define<I, F>(
        &self,
        config: RequestConfig<I, F, P, T>,
    ) -> Result<RequestDefinition<I, F, P, T, E>, ConfigError> {
        let RequestConfig {
            url,
            headers,
            request_payload,
            call_on_props,
            cancel_on_props,
            delete_cache_on_unmount,
            cache,
            options,
        } = config;

        if options.data_key.is_empty() {
            return Err(ConfigError::EmptyDataKey);
        }
        let method: Method = options.method.parse()?;

        let descriptor =
            RequestDescriptor::new(url, method, headers, request_payload, options.data_key);
        debug!(
            data_key = %descriptor.data_key(),
            method = %descriptor.method(),
            call_on_mount = options.call_on_mount,
            "request defined"
        );

        Ok(RequestDefinition {
            orchestrator: Arc::new(FetchOrchestrator::new(
                descriptor,
                cache,
                Arc::clone(&self.fetch),
            )),
            trigger: Arc::new(TriggerConfig {
                call_on_mount: options.call_on_mount,
                call_on_props,
                cancel_on_props,
                cancel_on_unmount: options.cancel_on_unmount,
                delete_cache_on_unmount,
                cancel: Arc::clone(&self.cancel),
            }),
        })
    }
}

impl<P, T, E> Clone for RequestClient<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            fetch: Arc::clone(&self.fetch),
            cancel: Arc::clone(&self.cancel),
        }
    }
}

impl<P, T, E> fmt::Debug for RequestClient<P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient").finish_non_exhaustive()
    }
}

/// A validated request definition shared by all of its mounted instances.
pub struct RequestDefinition<I, F, P, T, E> {
    orchestrator: Arc<FetchOrchestrator<I, F, P, T, E>>,
    trigger: Arc<TriggerConfig<I, P>>,
}

impl<I, F, P, T, E> RequestDefinition<I, F, P, T, E> {
    pub fn data_key(&self) -> &str {
        self.orchestrator.data_key()
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator<I, F, P, T, E>> {
        &self.orchestrator
    }

    /// State a fresh instance starts from: loading iff a mount fetch is scheduled.
    pub fn initial_state(&self) -> RequestState<T, E> {
        RequestState::new(self.trigger.call_on_mount)
    }

    /// Creates the per-instance policy. The instance stays inert until
    /// [`TriggerPolicy::init`] is called.
    pub fn mount(&self, inputs: I, sink: StateSink<T, E>) -> TriggerPolicy<I, F, P, T, E> {
        TriggerPolicy::new(
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.trigger),
            inputs,
            sink,
        )
    }
}

impl<I, F, P, T, E> Clone for RequestDefinition<I, F, P, T, E> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            trigger: Arc::clone(&self.trigger),
        }
    }
}

impl<I, F, P, T, E> fmt::Debug for RequestDefinition<I, F, P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDefinition")
            .field("orchestrator", &self.orchestrator)
            .field("trigger", &self.trigger)
            .finish()
    }
}
