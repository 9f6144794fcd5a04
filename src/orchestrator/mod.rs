//! Cache-aware fetch orchestration.
//!
//! [`FetchOrchestrator::invoke`] is the single entry point: resolve the
//! request, consult the cache, and either settle immediately from the cache or
//! call the network function and settle from its result.
//!
//! | Path          | Emissions                  | Network | `cache.set` |
//! |---------------|----------------------------|---------|-------------|
//! | cache hit     | `Loaded(cached)`           | no      | no          |
//! | miss, success | `Loading`, `Loaded(p)`     | once    | once        |
//! | miss, failure | `Loading`, `Failed(e)`     | once    | no          |

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::cache::{CacheAdapter, CacheResult};
use crate::descriptor::RequestDescriptor;
use crate::http::RequestData;
use crate::state::StateUpdate;

/// A boxed, `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Conversion trait for network functions.
///
/// Any `Fn(RequestData<P>) -> impl Future<Output = Result<T, E>> + Send` that is
/// also `Send + Sync + 'static` implements this trait through the blanket impl
/// below.
pub trait IntoFetch<P, T, E>: Send + Sync + 'static {
    /// Starts the network call, boxing the returned future.
    fn call(&self, request: RequestData<P>) -> BoxFuture<'static, Result<T, E>>;
}

impl<Func, Fut, P, T, E> IntoFetch<P, T, E> for Func
where
    Func: Fn(RequestData<P>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn call(&self, request: RequestData<P>) -> BoxFuture<'static, Result<T, E>> {
        Box::pin((self)(request))
    }
}

/// Type-erased, shareable network function.
pub type FetchFn<P, T, E> = Arc<dyn IntoFetch<P, T, E>>;

/// Type-erased, fire-and-forget cancellation callback.
pub type CancelFn<P> = Arc<dyn Fn(&RequestData<P>) + Send + Sync>;

/// Resolves requests, consults the cache, and calls the network on a miss.
///
/// Created once per definition and shared by every mounted instance: it holds
/// no per-instance state, and inputs and the emitter are passed on each call.
///
/// Type parameters: `I` inputs, `F` call-time parameters, `P` request payload,
/// `T` response payload, `E` network error.
pub struct FetchOrchestrator<I, F, P, T, E> {
    descriptor: RequestDescriptor<I, F, P>,
    cache: Arc<dyn CacheAdapter<I, P, T>>,
    fetch: FetchFn<P, T, E>,
}

impl<I, F, P, T, E> FetchOrchestrator<I, F, P, T, E> {
    pub fn new(
        descriptor: RequestDescriptor<I, F, P>,
        cache: Arc<dyn CacheAdapter<I, P, T>>,
        fetch: FetchFn<P, T, E>,
    ) -> Self {
        Self {
            descriptor,
            cache,
            fetch,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor<I, F, P> {
        &self.descriptor
    }

    pub fn data_key(&self) -> &str {
        self.descriptor.data_key()
    }

    /// Resolves the request `invoke` would send for these arguments.
    pub fn request_data(&self, inputs: &I, params: Option<&F>) -> RequestData<P> {
        self.descriptor.build(inputs, params)
    }
}

impl<I, F, P, T, E> FetchOrchestrator<I, F, P, T, E>
where
    P: Clone + 'static,
    T: 'static,
    E: 'static,
{
    /// Runs one fetch cycle, reporting progress through `emit`.
    ///
    /// A cache hit emits a single `Loaded` synchronously and never touches the
    /// network. A miss emits `Loading` before awaiting the network function, then
    /// stores a successful payload in the cache and emits `Loaded`, or emits
    /// `Failed` with the error unchanged.
    ///
    /// The future resolves after the final emission. Network failures end up in
    /// state, not in the return value. Overlapping calls are not sequenced: each
    /// settles independently and the later emission wins.
    ///
    /// # Errors
    ///
    /// Returns the [`CacheError`](crate::cache::CacheError) from a failing
    /// `get` or `set`. A failing `get` returns before any emission. A failing
    /// `set` is returned after `Loaded` has been emitted, so the state still
    /// settles.
    pub async fn invoke<S>(&self, emit: S, inputs: &I, params: Option<&F>) -> CacheResult<()>
    where
        S: Fn(StateUpdate<T, E>),
    {
        let request = self.descriptor.build(inputs, params);

        if let Some(cached) = self.cache.get(inputs, &request)? {
            debug!(
                data_key = %self.data_key(),
                method = %request.method,
                url = %request.url,
                "cache hit"
            );
            emit(StateUpdate::Loaded(cached));
            return Ok(());
        }

        trace!(data_key = %self.data_key(), url = %request.url, "cache miss, fetching");
        emit(StateUpdate::Loading);

        match self.fetch.call(request.clone()).await {
            Ok(payload) => {
                let stored = self.cache.set(inputs, &request, &payload);
                if let Err(error) = &stored {
                    warn!(data_key = %self.data_key(), url = %request.url, %error, "cache set failed");
                }
                debug!(data_key = %self.data_key(), url = %request.url, "fetch succeeded");
                emit(StateUpdate::Loaded(payload));
                stored
            }
            Err(error) => {
                debug!(data_key = %self.data_key(), url = %request.url, "fetch failed");
                emit(StateUpdate::Failed(error));
                Ok(())
            }
        }
    }
}

impl<I, F, P, T, E> fmt::Debug for FetchOrchestrator<I, F, P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cache::{CacheError, MemoryCache, NoCache};
    use crate::http::{Headers, Method};

    type Update = StateUpdate<String, String>;

    fn descriptor() -> RequestDescriptor<u32, String, String> {
        RequestDescriptor::new(
            Arc::new(|id: &u32, _: Option<&String>| format!("/items/{id}")),
            Method::Get,
            Arc::new(|_: &u32| Headers::new()),
            Arc::new(|_: &u32, params: Option<&String>| params.cloned()),
            "request",
        )
    }

    fn recorder() -> (impl Fn(Update), Arc<Mutex<Vec<Update>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (move |u| sink.lock().unwrap().push(u), seen)
    }

    // Records every `set` and answers `get` from a fixed value.
    struct SpyCache {
        hit: Option<String>,
        sets: Mutex<Vec<(u32, String, String)>>,
    }

    impl CacheAdapter<u32, String, String> for SpyCache {
        fn get(&self, _: &u32, _: &RequestData<String>) -> CacheResult<Option<String>> {
            Ok(self.hit.clone())
        }

        fn set(&self, inputs: &u32, request: &RequestData<String>, payload: &String) -> CacheResult<()> {
            self.sets
                .lock()
                .unwrap()
                .push((*inputs, request.url.clone(), payload.clone()));
            Ok(())
        }
    }

    struct FailingCache;

    impl CacheAdapter<u32, String, String> for FailingCache {
        fn get(&self, _: &u32, _: &RequestData<String>) -> CacheResult<Option<String>> {
            Err(CacheError::Backend("unavailable".into()))
        }

        fn set(&self, _: &u32, _: &RequestData<String>, _: &String) -> CacheResult<()> {
            Ok(())
        }
    }

    // Misses on every lookup and rejects every store.
    struct FullCache;

    impl CacheAdapter<u32, String, String> for FullCache {
        fn get(&self, _: &u32, _: &RequestData<String>) -> CacheResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _: &u32, _: &RequestData<String>, _: &String) -> CacheResult<()> {
            Err(CacheError::Backend("full".into()))
        }
    }

    fn counting_fetch(
        outcome: Result<&'static str, &'static str>,
    ) -> (FetchFn<String, String, String>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetch = move |_: RequestData<String>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { outcome.map(str::to_owned).map_err(str::to_owned) }
        };
        (Arc::new(fetch), calls)
    }

    #[tokio::test]
    async fn cache_hit_short_circuits() {
        let cache = Arc::new(SpyCache {
            hit: Some("cached".into()),
            sets: Mutex::new(Vec::new()),
        });
        let (fetch, calls) = counting_fetch(Ok("fresh"));
        let orchestrator = FetchOrchestrator::new(descriptor(), cache.clone(), fetch);
        let (emit, seen) = recorder();

        orchestrator.invoke(emit, &1, None).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Update::Loaded("cached".into())]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.sets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn miss_fetches_then_populates_cache() {
        let cache = Arc::new(SpyCache {
            hit: None,
            sets: Mutex::new(Vec::new()),
        });
        let (fetch, calls) = counting_fetch(Ok("fresh"));
        let orchestrator = FetchOrchestrator::new(descriptor(), cache.clone(), fetch);
        let (emit, seen) = recorder();

        orchestrator.invoke(emit, &5, None).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Update::Loading, Update::Loaded("fresh".into())]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *cache.sets.lock().unwrap(),
            vec![(5, "/items/5".to_string(), "fresh".to_string())]
        );
    }

    #[tokio::test]
    async fn failure_is_folded_into_state() {
        let cache = Arc::new(SpyCache {
            hit: None,
            sets: Mutex::new(Vec::new()),
        });
        let (fetch, _) = counting_fetch(Err("ERROR!!"));
        let orchestrator = FetchOrchestrator::new(descriptor(), cache.clone(), fetch);
        let (emit, seen) = recorder();

        let result = orchestrator.invoke(emit, &5, None).await;

        assert!(result.is_ok());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Update::Loading, Update::Failed("ERROR!!".into())]
        );
        assert!(cache.sets.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn call_params_reach_the_network() {
        let received = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&received);
        let fetch = move |request: RequestData<String>| {
            *slot.lock().unwrap() = Some(request);
            async { Ok::<_, String>("ok".to_string()) }
        };
        let orchestrator = FetchOrchestrator::new(descriptor(), Arc::new(NoCache), Arc::new(fetch));

        orchestrator
            .invoke(|_| {}, &2, Some(&"filter=new".to_string()))
            .await
            .unwrap();

        let request = received.lock().unwrap().take().unwrap();
        assert_eq!(request.url, "/items/2");
        assert_eq!(request.request_payload.as_deref(), Some("filter=new"));
    }

    #[tokio::test]
    async fn second_invoke_is_served_from_memory_cache() {
        let (fetch, calls) = counting_fetch(Ok("fresh"));
        let orchestrator =
            FetchOrchestrator::new(descriptor(), Arc::new(MemoryCache::<String>::new()), fetch);

        orchestrator.invoke(|_| {}, &1, None).await.unwrap();
        let (emit, seen) = recorder();
        orchestrator.invoke(emit, &1, None).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![Update::Loaded("fresh".into())]);
    }

    #[tokio::test]
    async fn cache_errors_propagate_before_any_emission() {
        let (fetch, calls) = counting_fetch(Ok("fresh"));
        let orchestrator = FetchOrchestrator::new(descriptor(), Arc::new(FailingCache), fetch);
        let (emit, seen) = recorder();

        let err = orchestrator.invoke(emit, &1, None).await.unwrap_err();

        assert!(matches!(err, CacheError::Backend(_)));
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_set_still_settles_then_reports() {
        let (fetch, calls) = counting_fetch(Ok("fresh"));
        let orchestrator = FetchOrchestrator::new(descriptor(), Arc::new(FullCache), fetch);
        let (emit, seen) = recorder();

        let err = orchestrator.invoke(emit, &1, None).await.unwrap_err();

        assert!(matches!(err, CacheError::Backend(ref reason) if reason == "full"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Update::Loading, Update::Loaded("fresh".into())]
        );
    }
}
