//! The resolved request handed to the network function.

use serde::Serialize;

use super::{Headers, Method};

/// A concrete request, rebuilt from the current inputs on every invocation.
///
/// It is both the argument to the network function and, together with the
/// inputs, the key presented to the cache adapter.
///
/// # Examples
///
/// ```
/// use fetch_state::http::{Headers, Method, RequestData};
///
/// let request = RequestData::new("/users/7", Method::Get)
///     .with_headers(Headers::new().with("Accept", "application/json"))
///     .with_payload(None::<()>);
///
/// assert_eq!(request.url, "/users/7");
/// assert_eq!(
///     request.cache_key().unwrap(),
///     r#"{"url":"/users/7","method":"GET","headers":[["Accept","application/json"]],"request_payload":null}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestData<P> {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub request_payload: Option<P>,
}

impl<P> RequestData<P> {
    /// Creates a request with no headers and no payload.
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Headers::new(),
            request_payload: None,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Option<P>) -> Self {
        self.request_payload = payload;
        self
    }
}

impl<P: Serialize> RequestData<P> {
    /// Returns a stable string identifying this request.
    ///
    /// Field order and header order are preserved, so equal requests always map
    /// to equal keys.
    pub fn cache_key(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
