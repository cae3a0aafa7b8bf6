//! # flightcache
//!
//! An in-memory HTTP response cache that deduplicates in-flight requests.
//!
//! The cache maps a request identity (method + URL) to the *future* of its
//! response. Callers that ask for the same identity while the first request
//! is still in flight await that same request rather than issuing their own.
//! Once the response arrives it stays cached only if its `Cache-Control`
//! header admits it; failed and non-cacheable responses are dropped.
//!
//! ## Quick Start
//!
//! ```rust
//! use flightcache::{RequestIdentity, Response, ResponseCache, StatusCode};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = ResponseCache::new();
//!     let id = RequestIdentity::new("GET", "https://example.com/feed");
//!
//!     let response = cache
//!         .fetch(&id, || async {
//!             // Perform the real HTTP exchange here.
//!             Ok::<_, std::io::Error>(
//!                 Response::new(StatusCode::OK)
//!                     .header("Cache-Control", "max-age=300")
//!                     .body("[]"),
//!             )
//!         })
//!         .await?;
//!
//!     assert_eq!(response.text()?, "[]");
//!     assert!(cache.contains(&id));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod http;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{
    AdmissionMode, CacheConfig, CacheError, RequestIdentity, ResponseCache,
    is_cacheable_response,
};
pub use http::{HeaderLookup, Headers, Method, Response, StatusCode};
