//! In-memory response cache keyed by [`RequestIdentity`].
//!
//! The cache stores the *future* of a response, not just a completed one.
//! [`ResponseCache::put`] inserts a pending response immediately, so a second
//! caller for the same identity awaits the same in-flight request instead of
//! issuing its own. Once the response settles, a continuation task decides
//! whether it may stay:
//!
//! | Settlement | Entry | Later lookups |
//! |---|---|---|
//! | response passing admission | kept | resolve with the response |
//! | response failing admission | removed | [`CacheError::Miss`] |
//! | upstream error | removed | [`CacheError::Miss`] |
//!
//! Lookups never mutate the map; removal is the continuation's job.
//!
//! ## Core types
//!
//! - [`RequestIdentity`]: where a request lives in the cache.
//! - [`ResponseCache`]: `lookup`, `put` and the combined `fetch`.
//! - [`AdmissionMode`] / [`is_cacheable_response`]: the admission predicate.
//! - [`CacheConfig`]: admission mode and optional lookup wait bound.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use crate::http::{HeaderLookup, Response};

pub mod admission;
pub mod config;
pub mod error;
pub mod identity;
mod stats;

pub use admission::{AdmissionMode, is_cacheable_response};
pub use config::CacheConfig;
pub use error::{BoxError, CacheError, UpstreamError, UpstreamPanic};
pub use identity::RequestIdentity;
pub use stats::CacheStatsSnapshot;

use stats::CacheStats;

type Settlement<R> = Result<R, UpstreamError>;

/// A single-settlement response handle observable by any number of waiters.
type SharedResponse<R> = Shared<BoxFuture<'static, Settlement<R>>>;

struct Entry<R> {
    /// Distinguishes this insertion from later ones under the same key.
    generation: u64,
    response: SharedResponse<R>,
}

impl<R: HeaderLookup + Clone> Entry<R> {
    /// Pending, or settled with an admissible response.
    fn is_servable(&self, admission: AdmissionMode) -> bool {
        match self.response.peek() {
            None => true,
            Some(Ok(response)) => admission.admits(response),
            Some(Err(_)) => false,
        }
    }
}

struct Inner<R> {
    entries: Mutex<BTreeMap<String, Entry<R>>>,
    next_generation: AtomicU64,
    stats: CacheStats,
}

impl<R> Inner<R> {
    /// Removes the entry for `key` only if it is still the one inserted with
    /// `generation`.
    fn evict(&self, key: &str, generation: u64) {
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.generation == generation) {
            entries.remove(key);
            drop(entries);
            self.stats.record_eviction();
            debug!(key, generation, "entry evicted");
        } else {
            trace!(key, generation, "entry already replaced, nothing to evict");
        }
    }
}

/// An in-memory cache of pending and settled responses.
///
/// Cloning is cheap and every clone shares the same entries. The response
/// type defaults to [`Response`]; any `Clone` type exposing its headers
/// through [`HeaderLookup`] works.
///
/// [`put`](Self::put) and [`fetch`](Self::fetch) spawn a Tokio task per
/// inserted entry. Outside a Tokio runtime nothing could remove a failed
/// entry, so nothing is stored: `put` drops the future and `fetch` just
/// awaits the request. A configured [`max_wait`](CacheConfig::max_wait)
/// needs the runtime's time driver.
///
/// # Examples
///
/// ```
/// use flightcache::cache::{RequestIdentity, ResponseCache};
/// use flightcache::http::{Method, Response, StatusCode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = ResponseCache::new();
/// let id = RequestIdentity::new(Method::Get, "https://example.com/feed");
///
/// // Nothing stored yet.
/// assert!(cache.lookup(&id).await.unwrap_err().is_miss());
///
/// cache.put(&id, async {
///     Ok::<_, std::io::Error>(
///         Response::new(StatusCode::OK).header("Cache-Control", "max-age=60"),
///     )
/// });
///
/// let hit = cache.lookup(&id).await.unwrap();
/// assert_eq!(hit.status(), StatusCode::OK);
/// # }
/// ```
pub struct ResponseCache<R = Response> {
    inner: Arc<Inner<R>>,
    config: CacheConfig,
}

impl<R> ResponseCache<R>
where
    R: HeaderLookup + Clone + Send + Sync + 'static,
{
    /// Creates an empty cache with the default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(BTreeMap::new()),
                next_generation: AtomicU64::new(0),
                stats: CacheStats::default(),
            }),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Looks up the response stored for `identity`.
    ///
    /// The map is read when `lookup` is called, not when the returned future
    /// is first polled, so the future is bound to whichever entry was present
    /// at call time. It fails with [`CacheError::Miss`] straight away if the
    /// identity is not cacheable or nothing is stored. Otherwise it waits for
    /// the stored response and then:
    ///
    /// - resolves with it if it passes admission,
    /// - fails with [`CacheError::Miss`] if it does not,
    /// - fails with [`CacheError::Upstream`] carrying the original error if
    ///   the upstream future failed,
    /// - fails with [`CacheError::Timeout`] if a wait bound is configured and
    ///   elapses first. The entry is left in place.
    pub fn lookup(
        &self,
        identity: &RequestIdentity,
    ) -> impl Future<Output = Result<R, CacheError>> + Send + use<R> {
        let pending = if identity.is_cacheable() {
            self.inner
                .entries
                .lock()
                .get(identity.key())
                .map(|entry| entry.response.clone())
        } else {
            None
        };

        let inner = Arc::clone(&self.inner);
        let admission = self.config.admission;
        let max_wait = self.config.max_wait_duration();
        let key = identity.key().to_owned();

        async move {
            let Some(pending) = pending else {
                trace!(key = %key, "cache miss");
                inner.stats.record_miss();
                return Err(CacheError::Miss);
            };

            match wait(&key, pending, max_wait).await {
                Ok(Ok(response)) if admission.admits(&response) => {
                    inner.stats.record_hit();
                    Ok(response)
                }
                Ok(Ok(_)) => {
                    trace!(key = %key, "stored response failed admission");
                    inner.stats.record_miss();
                    Err(CacheError::Miss)
                }
                Ok(Err(e)) => Err(CacheError::Upstream(e)),
                Err(timeout) => Err(timeout),
            }
        }
    }

    /// Stores the pending `response` for `identity`.
    ///
    /// Does nothing for a non-cacheable identity. Otherwise the entry is
    /// inserted before this call returns, replacing any previous entry for
    /// the same key, and a task is spawned that drives `response` to
    /// completion and removes the entry if it fails, panics or settles with
    /// a response failing admission.
    ///
    /// Called outside a Tokio runtime, `put` logs a warning and stores
    /// nothing.
    pub fn put<F, E>(&self, identity: &RequestIdentity, response: F)
    where
        F: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        if !identity.is_cacheable() {
            trace!(key = %identity, "identity not cacheable, put ignored");
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(key = %identity, "no tokio runtime, put ignored");
            return;
        };

        let response = share(response);
        let generation = {
            let mut entries = self.inner.entries.lock();
            self.insert(&mut entries, identity, response.clone())
        };
        self.spawn_cleanup(&runtime, identity, generation, response);
    }

    /// Serves `identity` from the cache or issues `request` and caches it.
    ///
    /// If a servable entry exists (still pending, or settled with an
    /// admissible response) its settlement is returned as-is, even when the
    /// joined response turns out not to be cacheable. Otherwise `request` is
    /// called, its future is [`put`](Self::put) and awaited. Concurrent
    /// calls for one identity issue at most one request; a request future
    /// that loses the race is dropped without being polled.
    ///
    /// Non-cacheable identities always call `request` and store nothing, as
    /// does a call made outside a Tokio runtime.
    pub async fn fetch<F, Fut, E>(
        &self,
        identity: &RequestIdentity,
        request: F,
    ) -> Result<R, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(runtime) if identity.is_cacheable() => runtime,
            Ok(_) => return request().await.map_err(upstream),
            Err(_) => {
                warn!(key = %identity, "no tokio runtime, fetching uncached");
                return request().await.map_err(upstream);
            }
        };

        let pending = match self.servable(identity) {
            Some(existing) => existing,
            None => {
                let fresh = share(request());
                let inserted = {
                    let mut entries = self.inner.entries.lock();
                    match entries
                        .get(identity.key())
                        .filter(|e| e.is_servable(self.config.admission))
                    {
                        Some(existing) => Err(existing.response.clone()),
                        None => Ok(self.insert(&mut entries, identity, fresh.clone())),
                    }
                };
                match inserted {
                    Ok(generation) => {
                        self.spawn_cleanup(&runtime, identity, generation, fresh.clone());
                        fresh
                    }
                    Err(existing) => {
                        self.note_join(identity);
                        existing
                    }
                }
            }
        };

        Ok(wait(identity.key(), pending, self.config.max_wait_duration()).await??)
    }

    /// Removes the entry for `identity`, returning whether one existed.
    ///
    /// A pending upstream future keeps running for anyone already awaiting it.
    pub fn delete(&self, identity: &RequestIdentity) -> bool {
        let removed = self.inner.entries.lock().remove(identity.key()).is_some();
        if removed {
            debug!(key = %identity, "entry deleted");
        }
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }

    /// Returns `true` if an entry (pending or settled) exists for `identity`.
    pub fn contains(&self, identity: &RequestIdentity) -> bool {
        self.inner.entries.lock().contains_key(identity.key())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Returns the stored keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.lock().keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.inner.stats.snapshot(self.len())
    }

    fn servable(&self, identity: &RequestIdentity) -> Option<SharedResponse<R>> {
        let existing = self
            .inner
            .entries
            .lock()
            .get(identity.key())
            .filter(|e| e.is_servable(self.config.admission))
            .map(|e| e.response.clone())?;
        self.note_join(identity);
        Some(existing)
    }

    fn note_join(&self, identity: &RequestIdentity) {
        self.inner.stats.record_join();
        debug!(key = %identity, "joined existing entry");
    }

    fn insert(
        &self,
        entries: &mut BTreeMap<String, Entry<R>>,
        identity: &RequestIdentity,
        response: SharedResponse<R>,
    ) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = entries
            .insert(
                identity.key().to_owned(),
                Entry {
                    generation,
                    response,
                },
            )
            .is_some();
        debug!(key = %identity, generation, replaced, "entry inserted");
        generation
    }

    fn spawn_cleanup(
        &self,
        runtime: &Handle,
        identity: &RequestIdentity,
        generation: u64,
        response: SharedResponse<R>,
    ) {
        let inner: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        let admission = self.config.admission;
        let key = identity.key().to_owned();

        runtime.spawn(async move {
            let keep = match response.await {
                Ok(response) => admission.admits(&response),
                Err(e) => {
                    debug!(key = %key, error = %e, "upstream request failed");
                    false
                }
            };
            if keep {
                trace!(key = %key, generation, "entry validated");
            } else if let Some(inner) = inner.upgrade() {
                inner.evict(&key, generation);
            }
        });
    }
}

/// Wraps an upstream future so it can be awaited by many waiters.
///
/// A panic inside `response` settles the entry with an [`UpstreamPanic`]
/// error instead of unwinding through whichever waiter polled it.
fn share<R, F, E>(response: F) -> SharedResponse<R>
where
    R: Clone + Send + Sync + 'static,
    F: Future<Output = Result<R, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    async move {
        match AssertUnwindSafe(response).catch_unwind().await {
            Ok(settled) => settled.map_err(UpstreamError::new),
            Err(payload) => Err(UpstreamError::new(UpstreamPanic::from_payload(
                &*payload,
            ))),
        }
    }
    .boxed()
    .shared()
}

fn upstream(error: impl Into<BoxError>) -> CacheError {
    CacheError::Upstream(UpstreamError::new(error))
}

async fn wait<R: Clone>(
    key: &str,
    pending: SharedResponse<R>,
    max_wait: Option<Duration>,
) -> Result<Settlement<R>, CacheError> {
    match max_wait {
        None => Ok(pending.await),
        Some(waited) => tokio::time::timeout(waited, pending).await.map_err(|_| {
            debug!(key, ?waited, "gave up waiting for pending entry");
            CacheError::Timeout { waited }
        }),
    }
}

impl<R> Clone for ResponseCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}

impl<R> Default for ResponseCache<R>
where
    R: HeaderLookup + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ResponseCache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.inner.entries.lock().len())
            .field("config", &self.config)
            .finish()
    }
}
