//! Configuration Module
//!
//! Loads server and cache configuration from environment variables.
//! Missing or unparsable values fall back to the defaults.

use std::env;
use std::str::FromStr;

use axum::http::{header, HeaderName, Method, StatusCode};

use crate::cache::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_BYTES};

/// Server and cache configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// Maximum accounted bytes across all cached responses
    pub max_bytes: usize,
    /// Largest response body that will be buffered and stored
    pub max_body_bytes: usize,
    /// Entry lifetime in seconds when the response sets none
    pub default_ttl: u64,
    /// Status codes whose responses may be stored
    pub cacheable_status_codes: Vec<StatusCode>,
    /// Request methods that may be served from the cache
    pub cacheable_methods: Vec<Method>,
    /// Request headers included in key derivation
    pub vary_headers: Vec<HeaderName>,
    /// Treat paths differing only in case as different resources
    pub case_sensitive_paths: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cached responses (default: 1000)
    /// - `MAX_BYTES` - Total byte bound (default: 100 MB)
    /// - `MAX_BODY_BYTES` - Largest cacheable body (default: 1 MB)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHEABLE_STATUS_CODES` - Comma list (default: `200`)
    /// - `CACHEABLE_METHODS` - Comma list (default: `GET,HEAD`)
    /// - `VARY_HEADERS` - Comma list (default: `accept,accept-encoding`)
    /// - `CASE_SENSITIVE_PATHS` - `true`/`false` (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            max_entries: parse_or(&lookup, "MAX_ENTRIES", defaults.max_entries),
            max_bytes: parse_or(&lookup, "MAX_BYTES", defaults.max_bytes),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes),
            default_ttl: parse_or(&lookup, "DEFAULT_TTL", defaults.default_ttl),
            cacheable_status_codes: list_or(
                &lookup,
                "CACHEABLE_STATUS_CODES",
                defaults.cacheable_status_codes,
            ),
            // Method names are case-sensitive; `get` would parse as an
            // extension method that never matches a request.
            cacheable_methods: list_or(
                &|name: &str| lookup(name).map(|raw| raw.to_uppercase()),
                "CACHEABLE_METHODS",
                defaults.cacheable_methods,
            ),
            vary_headers: list_or(&lookup, "VARY_HEADERS", defaults.vary_headers),
            case_sensitive_paths: parse_or(
                &lookup,
                "CASE_SENSITIVE_PATHS",
                defaults.case_sensitive_paths,
            ),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_or(&lookup, "CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_bytes: DEFAULT_MAX_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            default_ttl: 300,
            cacheable_status_codes: vec![StatusCode::OK],
            cacheable_methods: vec![Method::GET, Method::HEAD],
            vary_headers: vec![header::ACCEPT, header::ACCEPT_ENCODING],
            case_sensitive_paths: false,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a comma-separated list. Any bad item or an empty list keeps the
/// default.
fn list_or<F, T>(lookup: &F, name: &str, default: Vec<T>) -> Vec<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    let parsed: Option<Vec<T>> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().ok())
        .collect();

    match parsed {
        Some(items) if !items.is_empty() => items,
        _ => default,
    }
}
