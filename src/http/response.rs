//! HTTP response value.
//!
//! A [`Response`] is what an upstream future resolves to and what the cache
//! hands back to every waiter. The body is a [`Bytes`] buffer, so cloning a
//! response for each waiter does not copy the payload.

use std::str;

use bytes::Bytes;

use super::{HeaderLookup, Headers, StatusCode};

/// A complete HTTP response as seen by the cache.
///
/// # Examples
///
/// ```
/// use flightcache::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::OK)
///     .header("Cache-Control", "public, max-age=300")
///     .body(r#"{"status":"ok"}"#);
///
/// assert_eq!(response.headers().get("cache-control"), Some("public, max-age=300"));
/// assert_eq!(response.text().unwrap(), r#"{"status":"ok"}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header in-place, for callers that build a response
    /// incrementally from an upstream reply.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name, value);
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Bytes::from(body.into());
        self
    }

    /// Sets the response body from raw bytes.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.body)
    }

    /// Deserializes the body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(&self.body)
    }
}

impl HeaderLookup for Response {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
