//! Response header map with case-insensitive name lookup.
//!
//! HTTP field names are case-insensitive per [RFC 9110 §5.1], so a cached
//! response answers `cache-control` regardless of how the origin spelled it.
//!
//! [RFC 9110 §5.1]: https://www.rfc-editor.org/rfc/rfc9110#section-5.1

/// A case-insensitive, multi-value HTTP header map.
///
/// Preserves insertion order and allows multiple values per header name.
///
/// # Examples
///
/// ```
/// use flightcache::http::Headers;
///
/// let headers: Headers = [("Cache-Control", "max-age=60"), ("Vary", "Accept")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(headers.get("cache-control"), Some("max-age=60"));
/// assert_eq!(headers.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header entry. Multiple values for the same name are preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given header name (case-insensitive).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes all entries with the given header name (case-insensitive).
    ///
    /// Returns `true` if any entries were removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl<N, V> Extend<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("Cache-Control", "no-store");
        assert_eq!(h.get("cache-control"), Some("no-store"));
        assert_eq!(h.get("CACHE-CONTROL"), Some("no-store"));
        assert_eq!(h.get("Cache-Control"), Some("no-store"));
    }

    #[test]
    fn first_value_wins_for_get() {
        let h: Headers = [("Cache-Control", "max-age=1"), ("cache-control", "no-store")]
            .into_iter()
            .collect();
        assert_eq!(h.get("cache-control"), Some("max-age=1"));
        let vals: Vec<_> = h.get_all("Cache-Control").collect();
        assert_eq!(vals, vec!["max-age=1", "no-store"]);
    }

    #[test]
    fn remove() {
        let mut h = Headers::new();
        h.insert("Expires", "Thu, 01 Dec 2044 16:00:00 GMT");
        assert!(h.remove("expires"));
        assert!(h.is_empty());
        assert!(!h.remove("expires")); // already gone
    }

    #[test]
    fn contains() {
        let mut h = Headers::new();
        h.insert("ETag", "\"abc\"");
        assert!(h.contains("etag"));
        assert!(!h.contains("x-missing"));
    }
}
