//! Request primitives shared by the descriptor, the cache, and the network function.
//!
//! [`Method`] and [`Headers`] describe an outgoing call; [`RequestData`] is the
//! fully-resolved request built on every invocation.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod headers;
pub mod request;

pub use headers::Headers;
pub use request::RequestData;

/// A configured method string that is not a valid HTTP token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid HTTP method token: {0:?}")]
pub struct InvalidMethod(pub String);

/// An HTTP request method.
///
/// Standard methods are unit variants; anything else that is still a valid
/// token is kept verbatim in `Custom`.
///
/// # Examples
///
/// ```
/// use fetch_state::http::Method;
///
/// let method: Method = "GET".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
///
/// let purge: Method = "PURGE".parse().unwrap();
/// assert_eq!(purge, Method::Custom("PURGE".into()));
///
/// assert!("BAD METHOD".parse::<Method>().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    /// A non-standard extension method.
    Custom(String),
}

impl Method {
    /// Returns the method as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Custom(s) => s.as_str(),
        }
    }
}

// RFC 9110 §5.6.2 `tchar`.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            other if !other.is_empty() && other.chars().all(is_token_char) => {
                Self::Custom(other.to_owned())
            }
            other => return Err(InvalidMethod(other.to_owned())),
        })
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_methods_round_trip_through_str() {
        for raw in ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH"] {
            let method: Method = raw.parse().unwrap();
            assert!(!matches!(method, Method::Custom(_)));
            assert_eq!(method.to_string(), raw);
        }
    }

    #[test]
    fn lowercase_is_kept_verbatim() {
        let method: Method = "get".parse().unwrap();
        assert_eq!(method, Method::Custom("get".into()));
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!("".parse::<Method>(), Err(InvalidMethod(String::new())));
        assert!("GE T".parse::<Method>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Method::Patch).unwrap();
        assert_eq!(json, "\"PATCH\"");
    }
}
