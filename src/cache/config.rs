//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::admission::AdmissionMode;

/// Settings for a [`ResponseCache`](super::ResponseCache).
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use flightcache::cache::{AdmissionMode, CacheConfig};
///
/// let config: CacheConfig = serde_json::from_str(r#"{"admission":"strict"}"#).unwrap();
/// assert_eq!(config.admission, AdmissionMode::Strict);
/// assert_eq!(config.max_wait_duration(), None);
///
/// let config = CacheConfig::default().max_wait(Duration::from_secs(2));
/// assert_eq!(config.max_wait_ms, Some(2000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Predicate applied to a response once it settles.
    pub admission: AdmissionMode,

    /// Upper bound on how long a lookup waits for a pending entry, in
    /// milliseconds. `None` waits indefinitely.
    pub max_wait_ms: Option<u64>,
}

impl CacheConfig {
    #[must_use]
    pub fn admission(mut self, mode: AdmissionMode) -> Self {
        self.admission = mode;
        self
    }

    /// Bounds lookup waits. Sub-millisecond precision is truncated.
    #[must_use]
    pub fn max_wait(mut self, wait: Duration) -> Self {
        self.max_wait_ms = Some(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The configured lookup bound, if any.
    pub fn max_wait_duration(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_fields_missing() {
        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.admission, AdmissionMode::Prefix);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: Result<CacheConfig, _> = serde_json::from_str(r#"{"ttl":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn max_wait_is_stored_in_millis() {
        let config = CacheConfig::default()
            .admission(AdmissionMode::Strict)
            .max_wait(Duration::from_millis(250));
        let json = serde_json::to_string(&config).unwrap();
        let back: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_wait_duration(), Some(Duration::from_millis(250)));
        assert_eq!(back.admission, AdmissionMode::Strict);
    }
}
