//! HTTP value types consumed by the cache.
//!
//! This module provides the primitives a cached exchange is described with:
//! [`Method`], [`StatusCode`], [`Headers`], and [`Response`]. There is no
//! transport here; callers perform the exchange and hand the cache a
//! [`Response`] (or any type implementing [`HeaderLookup`]).

use std::fmt;
use std::sync::Arc;

pub mod headers;
pub mod response;

pub use headers::Headers;
pub use response::Response;

/// Read access to response header values by name.
///
/// The admission predicate only ever asks for `cache-control` (and, in strict
/// mode, `expires`), so any response representation can take part in caching
/// by exposing this one lookup.
pub trait HeaderLookup {
    /// Returns the raw value of the first header named `name`, if present.
    fn header_value(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for Headers {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for Arc<T> {
    fn header_value(&self, name: &str) -> Option<&str> {
        (**self).header_value(name)
    }
}

/// An HTTP response status code.
///
/// # Examples
///
/// ```
/// use flightcache::http::StatusCode;
///
/// let status = StatusCode::OK;
/// assert_eq!(status.as_u16(), 200);
/// assert!(status.is_success());
/// assert_eq!(StatusCode::from(404), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const NO_CONTENT: Self = Self(204);
    pub const PARTIAL_CONTENT: Self = Self(206);
    pub const MOVED_PERMANENTLY: Self = Self(301);
    pub const NOT_MODIFIED: Self = Self(304);
    pub const BAD_REQUEST: Self = Self(400);
    pub const NOT_FOUND: Self = Self(404);
    pub const GONE: Self = Self(410);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    pub const BAD_GATEWAY: Self = Self(502);
    pub const SERVICE_UNAVAILABLE: Self = Self(503);

    /// Returns the numeric status code as a `u16`.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns `true` for `2xx` codes.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Returns `true` for `5xx` codes.
    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::OK
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> u16 {
        code.as_u16()
    }
}

/// An HTTP request method.
///
/// Standard methods are unit variants; anything else is kept verbatim in
/// `Custom`. [`RequestIdentity`](crate::cache::RequestIdentity) accepts a
/// `Method` anywhere it accepts a method string.
///
/// # Examples
///
/// ```
/// use flightcache::http::Method;
///
/// let method: Method = "GET".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!(method.as_str(), "GET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
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
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Custom(other.to_owned()),
        })
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_method_round_trips_verbatim() {
        let m: Method = "PURGE".parse().unwrap();
        assert_eq!(m, Method::Custom("PURGE".to_owned()));
        assert_eq!(m.to_string(), "PURGE");
    }

    #[test]
    fn status_classes() {
        assert!(StatusCode::NO_CONTENT.is_success());
        assert!(!StatusCode::NOT_FOUND.is_success());
        assert!(StatusCode::BAD_GATEWAY.is_server_error());
        assert_eq!(StatusCode::default(), StatusCode::OK);
    }

    #[test]
    fn arc_forwards_header_lookup() {
        let mut h = Headers::new();
        h.insert("Cache-Control", "max-age=5");
        let shared = Arc::new(h);
        assert_eq!(shared.header_value("cache-control"), Some("max-age=5"));
    }
}
