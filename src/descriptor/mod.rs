//! Static description of how a request is derived from component inputs.

use std::fmt;
use std::sync::Arc;

use crate::http::{Headers, Method, RequestData};

/// Builds the request URL from the inputs and optional call-time parameters.
pub type UrlBuilder<I, F> = Arc<dyn Fn(&I, Option<&F>) -> String + Send + Sync>;

/// Builds the ordered request headers from the inputs.
pub type HeadersBuilder<I> = Arc<dyn Fn(&I) -> Headers + Send + Sync>;

/// Builds the optional request payload from the inputs and call-time parameters.
pub type PayloadBuilder<I, F, P> = Arc<dyn Fn(&I, Option<&F>) -> Option<P> + Send + Sync>;

/// Immutable recipe for turning inputs into a [`RequestData`].
///
/// One descriptor is created per definition and shared by every mounted
/// instance; it holds no per-instance state.
///
/// Type parameters: `I` inputs, `F` call-time parameters, `P` request payload.
pub struct RequestDescriptor<I, F, P> {
    url: UrlBuilder<I, F>,
    method: Method,
    headers: HeadersBuilder<I>,
    payload: PayloadBuilder<I, F, P>,
    data_key: String,
}

impl<I, F, P> RequestDescriptor<I, F, P> {
    pub fn new(
        url: UrlBuilder<I, F>,
        method: Method,
        headers: HeadersBuilder<I>,
        payload: PayloadBuilder<I, F, P>,
        data_key: impl Into<String>,
    ) -> Self {
        Self {
            url,
            method,
            headers,
            payload,
            data_key: data_key.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Namespace under which this request's state and handles are exposed.
    pub fn data_key(&self) -> &str {
        &self.data_key
    }

    /// Resolves a fresh request from `inputs` and optional `params`.
    pub fn build(&self, inputs: &I, params: Option<&F>) -> RequestData<P> {
        RequestData {
            url: (self.url)(inputs, params),
            method: self.method.clone(),
            headers: (self.headers)(inputs),
            request_payload: (self.payload)(inputs, params),
        }
    }
}

impl<I, F, P> Clone for RequestDescriptor<I, F, P> {
    fn clone(&self) -> Self {
        Self {
            url: Arc::clone(&self.url),
            method: self.method.clone(),
            headers: Arc::clone(&self.headers),
            payload: Arc::clone(&self.payload),
            data_key: self.data_key.clone(),
        }
    }
}

impl<I, F, P> fmt::Debug for RequestDescriptor<I, F, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("data_key", &self.data_key)
            .finish_non_exhaustive()
    }
}
