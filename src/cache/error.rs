//! Errors surfaced by cache lookups.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// A boxed, thread-safe error as accepted from upstream futures.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Why a lookup did not produce a response.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// No servable entry: nothing stored, the identity is not cacheable, or
    /// the stored response failed admission once it arrived.
    #[error("no cacheable response for this request")]
    Miss,

    /// The upstream future for this entry failed.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The entry was still pending when the configured wait elapsed.
    #[error("pending response not ready after {waited:?}")]
    Timeout { waited: Duration },
}

impl CacheError {
    /// Returns `true` for [`CacheError::Miss`].
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// The original error of a failed upstream future.
///
/// Every waiter on the same entry receives a clone pointing at the same
/// underlying error.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct UpstreamError(Arc<dyn StdError + Send + Sync>);

impl UpstreamError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(Arc::from(error.into()))
    }

    /// The error the upstream future failed with.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    /// Returns `true` if both values share one underlying error.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Stands in for the error of an upstream future that panicked.
#[derive(Debug, Clone, Error)]
#[error("upstream future panicked: {message}")]
pub struct UpstreamPanic {
    message: String,
}

impl UpstreamPanic {
    /// Builds the error from a panic payload, keeping its message when the
    /// payload is a string.
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string payload".to_owned()
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn upstream_error_keeps_original() {
        let err = UpstreamError::new(io::Error::other("connection reset"));
        assert_eq!(err.to_string(), "connection reset");
        let io_err = err.inner().downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }

    #[test]
    fn clones_share_the_error() {
        let err = UpstreamError::new("boom");
        let copy = err.clone();
        assert!(err.ptr_eq(&copy));
        assert!(!err.ptr_eq(&UpstreamError::new("boom")));
    }

    #[test]
    fn display() {
        assert_eq!(
            CacheError::from(UpstreamError::new("503 from origin")).to_string(),
            "upstream request failed: 503 from origin"
        );
        assert!(CacheError::Miss.is_miss());
        assert!(
            !CacheError::Timeout {
                waited: Duration::from_millis(5)
            }
            .is_miss()
        );
    }

    #[test]
    fn panic_payload_message_is_kept() {
        let static_str: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(
            UpstreamPanic::from_payload(&*static_str).message(),
            "index out of bounds"
        );

        let owned: Box<dyn Any + Send> = Box::new(String::from("bad state"));
        let err = UpstreamPanic::from_payload(&*owned);
        assert_eq!(err.to_string(), "upstream future panicked: bad state");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(
            UpstreamPanic::from_payload(&*other).message(),
            "non-string payload"
        );
    }
}
