//! Response admission: may a settled response stay in the cache?
//!
//! The default [`AdmissionMode::Prefix`] admits a response when any
//! `Cache-Control` directive token *starts with* `max-age`, `Expires` or
//! `s-maxage`. The match is a plain prefix test: `max-age=0` is admitted and
//! so is `max-age-lies`. Restrictive directives such as `no-store` are not
//! consulted. Only whitespace around commas is dropped, so a value with
//! leading whitespace (`" max-age=5"`) does not match.
//!
//! [`AdmissionMode::Strict`] compares directive names for equality
//! (case-insensitively) and looks for a real `Expires` header instead of an
//! `Expires` token inside `Cache-Control`.

use serde::{Deserialize, Serialize};

use crate::http::HeaderLookup;

const CACHE_CONTROL: &str = "cache-control";
const EXPIRES: &str = "expires";

const PREFIX_DIRECTIVES: [&str; 3] = ["max-age", "Expires", "s-maxage"];
const STRICT_DIRECTIVES: [&str; 2] = ["max-age", "s-maxage"];

/// How the admission predicate reads a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Case-sensitive prefix match on `Cache-Control` tokens.
    #[default]
    Prefix,
    /// Directive-name equality plus the `Expires` header.
    Strict,
}

impl AdmissionMode {
    /// Applies this mode's predicate to `response`.
    pub fn admits<R: HeaderLookup + ?Sized>(self, response: &R) -> bool {
        match self {
            Self::Prefix => is_cacheable_response(response),
            Self::Strict => is_cacheable_response_strict(response),
        }
    }
}

/// The default admission predicate.
///
/// # Examples
///
/// ```
/// use flightcache::cache::is_cacheable_response;
/// use flightcache::http::{Response, StatusCode};
///
/// let fresh = Response::new(StatusCode::OK).header("Cache-Control", "public, max-age=120");
/// assert!(is_cacheable_response(&fresh));
///
/// let bare = Response::new(StatusCode::OK);
/// assert!(!is_cacheable_response(&bare));
/// ```
pub fn is_cacheable_response<R: HeaderLookup + ?Sized>(response: &R) -> bool {
    directives(response).any(|token| {
        PREFIX_DIRECTIVES
            .iter()
            .any(|prefix| token.starts_with(prefix))
    })
}

fn is_cacheable_response_strict<R: HeaderLookup + ?Sized>(response: &R) -> bool {
    if response.header_value(EXPIRES).is_some() {
        return true;
    }
    directives(response).any(|token| {
        let token = token.trim();
        let name = token.split_once('=').map_or(token, |(name, _)| name).trim_end();
        STRICT_DIRECTIVES
            .iter()
            .any(|directive| name.eq_ignore_ascii_case(directive))
    })
}

/// `Cache-Control` tokens with the whitespace around each comma removed. The
/// start and end of the whole value are left as they are.
fn directives<R: HeaderLookup + ?Sized>(response: &R) -> impl Iterator<Item = &str> {
    response
        .header_value(CACHE_CONTROL)
        .into_iter()
        .flat_map(split_directives)
}

fn split_directives(value: &str) -> impl Iterator<Item = &str> {
    let last = value.matches(',').count();
    value.split(',').enumerate().map(move |(i, token)| {
        let token = if i > 0 { token.trim_start() } else { token };
        if i < last { token.trim_end() } else { token }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Response, StatusCode};

    fn with_cache_control(value: &str) -> Response {
        Response::new(StatusCode::OK).header("Cache-Control", value)
    }

    #[test]
    fn recognised_prefixes_admit() {
        for value in [
            "max-age=120",
            "public, max-age=120",
            "s-maxage=30",
            "no-cache ,  Expires=whenever",
        ] {
            assert!(is_cacheable_response(&with_cache_control(value)), "{value}");
        }
    }

    #[test]
    fn prefix_match_is_loose() {
        assert!(is_cacheable_response(&with_cache_control("max-age=0")));
        assert!(is_cacheable_response(&with_cache_control("max-age-lies")));
    }

    #[test]
    fn restrictive_directives_are_ignored() {
        assert!(is_cacheable_response(&with_cache_control("no-store, max-age=60")));
        assert!(!is_cacheable_response(&with_cache_control("no-store")));
        assert!(!is_cacheable_response(&with_cache_control("private, no-cache")));
    }

    #[test]
    fn missing_header_is_not_cacheable() {
        let r = Response::new(StatusCode::OK).header("Expires", "Thu, 01 Dec 2044 16:00:00 GMT");
        assert!(!is_cacheable_response(&r));
    }

    #[test]
    fn prefix_mode_is_case_sensitive_on_tokens() {
        assert!(!is_cacheable_response(&with_cache_control("Max-Age=60")));
        assert!(!is_cacheable_response(&with_cache_control("expires=1")));
    }

    #[test]
    fn only_whitespace_around_commas_is_dropped() {
        assert!(!is_cacheable_response(&with_cache_control(" max-age=5")));
        assert!(!is_cacheable_response(&with_cache_control("\tmax-age=5")));
        assert!(is_cacheable_response(&with_cache_control("max-age=5 ")));
        assert!(is_cacheable_response(&with_cache_control(" private ,\tmax-age=5 ")));
        assert!(AdmissionMode::Strict.admits(&with_cache_control(" max-age=5")));
    }

    #[test]
    fn split_keeps_outer_whitespace() {
        let tokens: Vec<_> = split_directives("  a , b,c  ").collect();
        assert_eq!(tokens, ["  a", "b", "c  "]);
        assert_eq!(split_directives(" solo ").collect::<Vec<_>>(), [" solo "]);
    }

    /// Header storage keyed by exact, case-sensitive names.
    struct ExactHeaders(Vec<(&'static str, &'static str)>);

    impl HeaderLookup for ExactHeaders {
        fn header_value(&self, name: &str) -> Option<&str> {
            self.0.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
        }
    }

    #[test]
    fn predicate_asks_for_lowercase_cache_control() {
        let lowercase = ExactHeaders(vec![("cache-control", "max-age=60")]);
        assert!(is_cacheable_response(&lowercase));

        let mixed_case = ExactHeaders(vec![("Cache-Control", "max-age=60")]);
        assert!(!is_cacheable_response(&mixed_case));
        assert!(!AdmissionMode::Strict.admits(&mixed_case));

        let expires = ExactHeaders(vec![("expires", "Thu, 01 Dec 2044 16:00:00 GMT")]);
        assert!(AdmissionMode::Strict.admits(&expires));
    }

    #[test]
    fn header_name_lookup_ignores_case() {
        let r = Response::new(StatusCode::OK).header("CACHE-CONTROL", "max-age=5");
        assert!(is_cacheable_response(&r));
    }

    #[test]
    fn strict_mode_compares_directive_names() {
        let strict = AdmissionMode::Strict;
        assert!(strict.admits(&with_cache_control("Max-Age=60")));
        assert!(strict.admits(&with_cache_control("private, s-maxage = 10")));
        assert!(!strict.admits(&with_cache_control("max-age-lies")));
        assert!(!strict.admits(&with_cache_control("Expires=1")));
    }

    #[test]
    fn strict_mode_honours_expires_header() {
        let r = Response::new(StatusCode::OK).header("Expires", "Thu, 01 Dec 2044 16:00:00 GMT");
        assert!(AdmissionMode::Strict.admits(&r));
        assert!(!AdmissionMode::Prefix.admits(&r));
    }
}
