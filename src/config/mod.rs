//! Request configuration with every default resolved in one place.
//!
//! A [`RequestConfig`] is the builder a caller fills in; only the URL builder
//! is mandatory. Defaults:
//!
//! | Setting                   | Default                         |
//! |---------------------------|---------------------------------|
//! | `method`                  | [`DEFAULT_METHOD`] (`"GET"`)    |
//! | `headers`                 | none                            |
//! | `data_key`                | [`DEFAULT_DATA_KEY`] (`"request"`) |
//! | `request_payload`         | none                            |
//! | `call_on_mount`           | `true`                          |
//! | `call_on_props`           | never                           |
//! | `cancel_on_props`         | never                           |
//! | `cancel_on_unmount`       | `true`                          |
//! | `delete_cache_on_unmount` | no-op                           |
//! | `cache`                   | [`NoCache`]                     |
//!
//! The plain-data subset of these settings can also be loaded from any serde
//! format as [`RequestOptions`].

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::{CacheAdapter, NoCache};
use crate::descriptor::{HeadersBuilder, PayloadBuilder, UrlBuilder};
use crate::http::{Headers, InvalidMethod};
use crate::trigger::{CleanupFn, InputsPredicate};

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_DATA_KEY: &str = "request";

/// Errors detected when a configuration is turned into a definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("data key must not be empty")]
    EmptyDataKey,

    #[error(transparent)]
    Method(#[from] InvalidMethod),
}

/// Serializable request settings.
///
/// Missing fields take the same defaults as [`RequestConfig::new`].
///
/// # Examples
///
/// ```
/// use fetch_state::config::RequestOptions;
///
/// let options: RequestOptions =
///     serde_json::from_str(r#"{ "method": "POST", "data_key": "search" }"#).unwrap();
///
/// assert_eq!(options.method, "POST");
/// assert!(options.call_on_mount);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub method: String,
    pub data_key: String,
    pub call_on_mount: bool,
    pub cancel_on_unmount: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_owned(),
            data_key: DEFAULT_DATA_KEY.to_owned(),
            call_on_mount: true,
            cancel_on_unmount: true,
        }
    }
}

/// Builder for a request definition.
///
/// Type parameters: `I` inputs, `F` call-time parameters, `P` request payload,
/// `T` response payload.
///
/// # Examples
///
/// ```
/// use fetch_state::config::RequestConfig;
///
/// struct Props {
///     user_id: u64,
/// }
///
/// let config = RequestConfig::<Props, (), (), String>::new(|props: &Props, _: Option<&()>| {
///     format!("/users/{}", props.user_id)
/// })
/// .method("GET")
/// .data_key("user")
/// .call_on_props(|prev: &Props, next: &Props| prev.user_id != next.user_id);
///
/// assert_eq!(config.options().data_key, "user");
/// ```
pub struct RequestConfig<I, F, P, T> {
    pub(crate) url: UrlBuilder<I, F>,
    pub(crate) headers: HeadersBuilder<I>,
    pub(crate) request_payload: PayloadBuilder<I, F, P>,
    pub(crate) call_on_props: InputsPredicate<I>,
    pub(crate) cancel_on_props: InputsPredicate<I>,
    pub(crate) delete_cache_on_unmount: CleanupFn,
    pub(crate) cache: Arc<dyn CacheAdapter<I, P, T>>,
    pub(crate) options: RequestOptions,
}

impl<I, F, P, T> RequestConfig<I, F, P, T> {
    /// Starts a configuration from the mandatory URL builder.
    pub fn new<U>(url: U) -> Self
    where
        U: Fn(&I, Option<&F>) -> String + Send + Sync + 'static,
    {
        Self {
            url: Arc::new(url),
            headers: Arc::new(|_: &I| Headers::new()),
            request_payload: Arc::new(|_: &I, _: Option<&F>| None),
            call_on_props: Arc::new(|_: &I, _: &I| false),
            cancel_on_props: Arc::new(|_: &I, _: &I| false),
            delete_cache_on_unmount: Arc::new(|| {}),
            cache: Arc::new(NoCache),
            options: RequestOptions::default(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.options.method = method.into();
        self
    }

    #[must_use]
    pub fn headers<H>(mut self, headers: H) -> Self
    where
        H: Fn(&I) -> Headers + Send + Sync + 'static,
    {
        self.headers = Arc::new(headers);
        self
    }

    #[must_use]
    pub fn data_key(mut self, data_key: impl Into<String>) -> Self {
        self.options.data_key = data_key.into();
        self
    }

    #[must_use]
    pub fn request_payload<B>(mut self, build: B) -> Self
    where
        B: Fn(&I, Option<&F>) -> Option<P> + Send + Sync + 'static,
    {
        self.request_payload = Arc::new(build);
        self
    }

    /// Refetch when this returns `true` for a `(previous, next)` input change.
    #[must_use]
    pub fn call_on_props<C>(mut self, predicate: C) -> Self
    where
        C: Fn(&I, &I) -> bool + Send + Sync + 'static,
    {
        self.call_on_props = Arc::new(predicate);
        self
    }

    #[must_use]
    pub fn call_on_mount(mut self, enabled: bool) -> Self {
        self.options.call_on_mount = enabled;
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn CacheAdapter<I, P, T>>) -> Self {
        self.cache = cache;
        self
    }

    /// Runs on every teardown, whatever the other settings.
    #[must_use]
    pub fn delete_cache_on_unmount<D>(mut self, cleanup: D) -> Self
    where
        D: Fn() + Send + Sync + 'static,
    {
        self.delete_cache_on_unmount = Arc::new(cleanup);
        self
    }

    #[must_use]
    pub fn cancel_on_unmount(mut self, enabled: bool) -> Self {
        self.options.cancel_on_unmount = enabled;
        self
    }

    /// Cancel when this returns `true` for a `(previous, next)` input change.
    #[must_use]
    pub fn cancel_on_props<C>(mut self, predicate: C) -> Self
    where
        C: Fn(&I, &I) -> bool + Send + Sync + 'static,
    {
        self.cancel_on_props = Arc::new(predicate);
        self
    }

    /// Replaces the plain-data settings wholesale.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }
}
