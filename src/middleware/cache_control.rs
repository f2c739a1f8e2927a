//! Cache-Control parsing
//!
//! Only the directives that affect storing or serving from this cache are
//! kept; everything else is ignored.

use std::time::Duration;

use axum::http::{header, HeaderMap};

/// Directives read from one or more `Cache-Control` headers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub private: bool,
    pub max_age: Option<Duration>,
    pub s_maxage: Option<Duration>,
}

impl CacheControl {
    /// Parses every `Cache-Control` header in `headers`.
    ///
    /// Returns `None` when the header is absent. Values that are not valid
    /// strings are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mut values = headers
            .get_all(header::CACHE_CONTROL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .peekable();
        values.peek()?;

        let mut parsed = Self::default();
        for value in values {
            parsed.merge(value);
        }
        Some(parsed)
    }

    /// Parses a single header value.
    pub fn parse(value: &str) -> Self {
        let mut parsed = Self::default();
        parsed.merge(value);
        parsed
    }

    fn merge(&mut self, value: &str) {
        for directive in value.split(',') {
            let directive = directive.trim();
            let (name, arg) = match directive.split_once('=') {
                Some((name, arg)) => (name.trim(), Some(arg.trim().trim_matches('"'))),
                None => (directive, None),
            };

            match name.to_ascii_lowercase().as_str() {
                "no-cache" => self.no_cache = true,
                "no-store" => self.no_store = true,
                "private" => self.private = true,
                "max-age" => self.max_age = arg.and_then(parse_seconds).or(self.max_age),
                "s-maxage" => self.s_maxage = arg.and_then(parse_seconds).or(self.s_maxage),
                _ => {}
            }
        }
    }

    /// Lifetime the origin asked shared caches to use, if any.
    pub fn shared_max_age(&self) -> Option<Duration> {
        self.s_maxage.or(self.max_age)
    }
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    raw.parse::<u64>().ok().map(Duration::from_secs)
}

/// True when the request carries `Pragma: no-cache`.
pub fn has_pragma_no_cache(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::PRAGMA)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.to_ascii_lowercase().contains("no-cache"))
}
