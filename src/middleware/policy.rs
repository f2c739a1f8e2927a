//! Cacheability rules
//!
//! Decides whether a request may use the cache and whether a response may
//! be stored, and for how long.

use std::collections::HashSet;
use std::time::Duration;

use axum::http::{header, HeaderMap, Method, StatusCode};

use super::cache_control::{has_pragma_no_cache, CacheControl};
use crate::config::Config;

// == Decisions ==
/// Why a request skipped the cache entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Method is not in the cacheable set
    Method,
    /// Request asked for a fresh response
    NoCacheDirective,
    /// Request carries credentials
    Authorization,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::Method => "method",
            BypassReason::NoCacheDirective => "no-cache",
            BypassReason::Authorization => "authorization",
        }
    }
}

/// Outcome of inspecting an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Cacheable,
    Bypass(BypassReason),
}

// == Cache Policy ==
#[derive(Debug, Clone)]
pub struct CachePolicy {
    methods: Vec<Method>,
    status_codes: HashSet<StatusCode>,
    default_ttl: Duration,
    max_body_bytes: usize,
}

impl CachePolicy {
    pub fn new(
        methods: Vec<Method>,
        status_codes: impl IntoIterator<Item = StatusCode>,
        default_ttl: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            methods,
            status_codes: status_codes.into_iter().collect(),
            default_ttl,
            max_body_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.cacheable_methods.clone(),
            config.cacheable_status_codes.iter().copied(),
            Duration::from_secs(config.default_ttl),
            config.max_body_bytes,
        )
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    // == Request Side ==
    pub fn check_request(&self, method: &Method, headers: &HeaderMap) -> RequestDecision {
        if !self.methods.contains(method) {
            return RequestDecision::Bypass(BypassReason::Method);
        }

        let no_cache = match CacheControl::from_headers(headers) {
            Some(cc) => cc.no_cache || cc.no_store,
            None => has_pragma_no_cache(headers),
        };
        if no_cache {
            return RequestDecision::Bypass(BypassReason::NoCacheDirective);
        }

        if headers.contains_key(header::AUTHORIZATION) {
            return RequestDecision::Bypass(BypassReason::Authorization);
        }

        RequestDecision::Cacheable
    }

    // == Response Side ==
    /// Returns the lifetime to store a response for, or `None` when it must
    /// not be stored.
    ///
    /// `s-maxage` wins over `max-age`, which wins over the default TTL.
    pub fn response_ttl(&self, status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
        if !self.status_codes.contains(&status) {
            return None;
        }

        if headers.contains_key(header::SET_COOKIE) {
            return None;
        }

        let vary_any = headers
            .get_all(header::VARY)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.split(',').any(|part| part.trim() == "*"));
        if vary_any {
            return None;
        }

        let ttl = match CacheControl::from_headers(headers) {
            Some(cc) if cc.no_store || cc.no_cache || cc.private => return None,
            Some(cc) => cc.shared_max_age().unwrap_or(self.default_ttl),
            None => self.default_ttl,
        };

        (!ttl.is_zero()).then_some(ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn policy() -> CachePolicy {
        CachePolicy::new(
            vec![Method::GET, Method::HEAD],
            [StatusCode::OK],
            Duration::from_secs(60),
            1024,
        )
    }

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_get_and_head_are_cacheable() {
        let policy = policy();
        assert_eq!(policy.check_request(&Method::GET, &HeaderMap::new()), RequestDecision::Cacheable);
        assert_eq!(policy.check_request(&Method::HEAD, &HeaderMap::new()), RequestDecision::Cacheable);
    }

    #[test]
    fn test_post_bypasses() {
        assert_eq!(
            policy().check_request(&Method::POST, &HeaderMap::new()),
            RequestDecision::Bypass(BypassReason::Method)
        );
    }

    #[test]
    fn test_request_no_cache_bypasses() {
        let policy = policy();
        for value in ["no-cache", "no-store", "max-age=0, no-cache"] {
            assert_eq!(
                policy.check_request(&Method::GET, &headers(&[(header::CACHE_CONTROL, value)])),
                RequestDecision::Bypass(BypassReason::NoCacheDirective)
            );
        }
    }

    #[test]
    fn test_pragma_only_counts_without_cache_control() {
        let policy = policy();
        assert_eq!(
            policy.check_request(&Method::GET, &headers(&[(header::PRAGMA, "no-cache")])),
            RequestDecision::Bypass(BypassReason::NoCacheDirective)
        );
        assert_eq!(
            policy.check_request(
                &Method::GET,
                &headers(&[(header::PRAGMA, "no-cache"), (header::CACHE_CONTROL, "max-age=10")])
            ),
            RequestDecision::Cacheable
        );
    }

    #[test]
    fn test_authorization_bypasses() {
        assert_eq!(
            policy().check_request(&Method::GET, &headers(&[(header::AUTHORIZATION, "Bearer x")])),
            RequestDecision::Bypass(BypassReason::Authorization)
        );
    }

    #[test]
    fn test_response_default_ttl() {
        assert_eq!(
            policy().response_ttl(StatusCode::OK, &HeaderMap::new()),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_response_status_not_allowed() {
        let policy = policy();
        assert_eq!(policy.response_ttl(StatusCode::NOT_FOUND, &HeaderMap::new()), None);
        assert_eq!(policy.response_ttl(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new()), None);
    }

    #[test]
    fn test_response_directives_prevent_storing() {
        let policy = policy();
        for value in ["no-store", "no-cache", "private, max-age=60"] {
            assert_eq!(
                policy.response_ttl(StatusCode::OK, &headers(&[(header::CACHE_CONTROL, value)])),
                None,
                "{value} should not be stored"
            );
        }
    }

    #[test]
    fn test_response_max_age_overrides_default() {
        let policy = policy();
        assert_eq!(
            policy.response_ttl(StatusCode::OK, &headers(&[(header::CACHE_CONTROL, "public, max-age=5")])),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            policy.response_ttl(StatusCode::OK, &headers(&[(header::CACHE_CONTROL, "max-age=0")])),
            None
        );
    }

    #[test]
    fn test_set_cookie_and_vary_star_prevent_storing() {
        let policy = policy();
        assert_eq!(
            policy.response_ttl(StatusCode::OK, &headers(&[(header::SET_COOKIE, "id=1")])),
            None
        );
        assert_eq!(
            policy.response_ttl(StatusCode::OK, &headers(&[(header::VARY, "accept, *")])),
            None
        );
        assert!(policy
            .response_ttl(StatusCode::OK, &headers(&[(header::VARY, "accept")]))
            .is_some());
    }

    #[test]
    fn test_bypass_reason_labels() {
        assert_eq!(BypassReason::Method.as_str(), "method");
        assert_eq!(BypassReason::NoCacheDirective.as_str(), "no-cache");
        assert_eq!(BypassReason::Authorization.as_str(), "authorization");
    }
}
