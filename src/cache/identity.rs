//! Request identity derived from method and URL.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Joins method and URL in the identity key.
///
/// SP delimits method and request-target on an HTTP request line, so it can
/// appear in neither.
const SEPARATOR: char = ' ';

/// Key of the identity built from an absent method and URL.
const UNCACHEABLE_KEY: &str = " ";

/// The cache placement of a request.
///
/// Two identities are equal iff their keys are equal. No validation is done
/// on construction; callers must not pass a method or URL containing a space.
///
/// # Examples
///
/// ```
/// use flightcache::cache::RequestIdentity;
/// use flightcache::http::Method;
///
/// let id = RequestIdentity::new(Method::Get, "https://example.com/a");
/// assert_eq!(id.key(), "GET https://example.com/a");
/// assert!(id.is_cacheable());
///
/// assert!(!RequestIdentity::from_parts(None::<&str>, None::<&str>).is_cacheable());
/// ```
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    key: String,
}

impl RequestIdentity {
    pub fn new(method: impl AsRef<str>, url: impl AsRef<str>) -> Self {
        let (method, url) = (method.as_ref(), url.as_ref());
        let mut key = String::with_capacity(method.len() + url.len() + 1);
        key.push_str(method);
        key.push(SEPARATOR);
        key.push_str(url);
        Self { key }
    }

    /// Builds an identity from optional parts; absent parts count as empty.
    pub fn from_parts<M, U>(method: Option<M>, url: Option<U>) -> Self
    where
        M: AsRef<str>,
        U: AsRef<str>,
    {
        Self::new(
            method.as_ref().map_or("", |m| m.as_ref()),
            url.as_ref().map_or("", |u| u.as_ref()),
        )
    }

    /// The sentinel identity that disables caching.
    pub fn uncacheable() -> Self {
        Self {
            key: UNCACHEABLE_KEY.to_owned(),
        }
    }

    /// Returns `false` for the sentinel and for anything whose key collides
    /// with it, i.e. an empty method together with an empty URL.
    pub fn is_cacheable(&self) -> bool {
        self.key != UNCACHEABLE_KEY
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn method(&self) -> &str {
        self.split().0
    }

    pub fn url(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        self.key.split_once(SEPARATOR).unwrap_or((self.key.as_str(), ""))
    }
}

impl PartialEq for RequestIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RequestIdentity {}

impl Hash for RequestIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for RequestIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    #[test]
    fn ordinary_requests_are_cacheable() {
        for (method, url) in [
            ("GET", "https://example.com/"),
            ("POST", "/submit"),
            ("PURGE", "http://cdn.local/asset.js?v=2"),
        ] {
            let id = RequestIdentity::new(method, url);
            assert!(id.is_cacheable(), "{id} should be cacheable");
            assert_eq!(id.method(), method);
            assert_eq!(id.url(), url);
        }
    }

    #[test]
    fn absent_parts_disable_caching() {
        assert!(!RequestIdentity::uncacheable().is_cacheable());
        assert!(!RequestIdentity::from_parts(None::<&str>, None::<&str>).is_cacheable());
        assert!(!RequestIdentity::new("", "").is_cacheable());
        assert_eq!(RequestIdentity::new("", ""), RequestIdentity::uncacheable());
    }

    #[test]
    fn one_absent_part_is_still_cacheable() {
        assert!(RequestIdentity::from_parts(Some("GET"), None::<&str>).is_cacheable());
        assert!(RequestIdentity::from_parts(None::<&str>, Some("/x")).is_cacheable());
    }

    #[test]
    fn equal_pairs_derive_equal_keys() {
        let a = RequestIdentity::new(Method::Get, "/a");
        let b = RequestIdentity::new("GET", String::from("/a"));
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn distinct_pairs_derive_distinct_keys() {
        let ids = [
            RequestIdentity::new("GET", "/a"),
            RequestIdentity::new("HEAD", "/a"),
            RequestIdentity::new("GET", "/a/"),
            RequestIdentity::new("GETX", "a"),
            RequestIdentity::new("GET", "X/a"),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
