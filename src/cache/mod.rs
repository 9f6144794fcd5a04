//! Response caching consulted before, and populated after, a network call.
//!
//! The orchestrator only speaks to the [`CacheAdapter`] trait. Two adapters
//! ship with the crate:
//!
//! - [`NoCache`] — always misses, never stores. The default.
//! - [`MemoryCache`] — in-process map keyed by [`RequestData::cache_key`].
//!
//! Eviction and expiry are entirely the adapter's business.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::http::RequestData;

/// Errors raised by a cache adapter.
///
/// The orchestrator does not catch these; they propagate out of
/// [`FetchOrchestrator::invoke`](crate::orchestrator::FetchOrchestrator::invoke).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to derive cache key: {0}")]
    Key(#[from] serde_json::Error),

    #[error("cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Synchronous key-value store for fetched payloads.
///
/// Lookups are keyed by the instance inputs together with the resolved
/// request. Implementations must not touch orchestrator state; `get` is called
/// before every network call and `set` once after every successful one.
///
/// Type parameters: `I` inputs, `P` request payload, `T` response payload.
pub trait CacheAdapter<I, P, T>: Send + Sync {
    /// Returns the cached payload, or `None` on a miss.
    fn get(&self, inputs: &I, request: &RequestData<P>) -> CacheResult<Option<T>>;

    /// Stores a freshly fetched payload.
    fn set(&self, inputs: &I, request: &RequestData<P>, payload: &T) -> CacheResult<()>;
}

/// The absent cache: every lookup misses and every store is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<I, P, T> CacheAdapter<I, P, T> for NoCache {
    fn get(&self, _inputs: &I, _request: &RequestData<P>) -> CacheResult<Option<T>> {
        Ok(None)
    }

    fn set(&self, _inputs: &I, _request: &RequestData<P>, _payload: &T) -> CacheResult<()> {
        Ok(())
    }
}

/// An unbounded in-memory cache keyed by the serialized request.
///
/// Inputs do not take part in the key: two instances whose inputs resolve to
/// the same request share an entry.
///
/// # Examples
///
/// ```
/// use fetch_state::cache::{CacheAdapter, MemoryCache};
/// use fetch_state::http::{Method, RequestData};
///
/// let cache = MemoryCache::<u32>::new();
/// let request = RequestData::<()>::new("/stats", Method::Get);
///
/// assert_eq!(cache.get(&(), &request).unwrap(), None);
/// cache.set(&(), &request, &42u32).unwrap();
/// assert_eq!(cache.get(&(), &request).unwrap(), Some(42));
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct MemoryCache<T> {
    entries: Mutex<HashMap<String, T>>,
}

impl<T> Default for MemoryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        trace!(evicted = entries.len(), "memory cache cleared");
        entries.clear();
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I, P, T> CacheAdapter<I, P, T> for MemoryCache<T>
where
    P: Serialize,
    T: Clone + Send,
{
    fn get(&self, _inputs: &I, request: &RequestData<P>) -> CacheResult<Option<T>> {
        let key = request.cache_key()?;
        Ok(self.lock().get(&key).cloned())
    }

    fn set(&self, _inputs: &I, request: &RequestData<P>, payload: &T) -> CacheResult<()> {
        let key = request.cache_key()?;
        self.lock().insert(key, payload.clone());
        Ok(())
    }
}
