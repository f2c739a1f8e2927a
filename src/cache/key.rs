//! Cache Key Module
//!
//! Derives deterministic cache keys from the cache-relevant parts of a request.
//!
//! A key is a sequence of length-prefixed segments (`<len>:<bytes>`):
//! method, normalized path, sorted query, then one name/value pair per vary
//! header. An absent vary header is written as `-` instead of a value segment,
//! which keeps it distinct from a header that is present but empty.

use std::fmt;
use std::fmt::Write;

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, Method, Request, Uri,
};

use crate::error::{CacheError, Result};

// == Cache Key ==
/// Opaque, deterministic identifier of a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Returns the encoded key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the encoded key in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when this key belongs to the resource described by `prefix`.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// == Key Builder ==
/// Builds cache keys from method, path, query and the configured vary headers.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    /// Header names included in the key, sorted and deduplicated
    vary_headers: Vec<HeaderName>,
    /// Whether `/Weather` and `/weather` are different resources
    case_sensitive_paths: bool,
}

impl KeyBuilder {
    // == Constructor ==
    pub fn new(mut vary_headers: Vec<HeaderName>, case_sensitive_paths: bool) -> Self {
        vary_headers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        vary_headers.dedup();

        Self {
            vary_headers,
            case_sensitive_paths,
        }
    }

    /// Header names that take part in key derivation.
    pub fn vary_headers(&self) -> &[HeaderName] {
        &self.vary_headers
    }

    // == Build ==
    /// Derives the key for a request.
    ///
    /// Fails only when a vary header carries bytes that are not visible
    /// ASCII, in which case the caller should not cache the request.
    pub fn build(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> Result<CacheKey> {
        let mut key = self.resource_prefix(method, uri);

        for name in &self.vary_headers {
            let mut values = Vec::new();
            for value in headers.get_all(name) {
                let value = value.to_str().map_err(|_| {
                    CacheError::KeyDerivation(format!(
                        "header '{}' contains non-ASCII bytes",
                        name
                    ))
                })?;
                values.push(value.trim());
            }

            push_segment(&mut key, name.as_str());
            if values.is_empty() {
                key.push('-');
            } else {
                push_segment(&mut key, &values.join(","));
            }
        }

        Ok(CacheKey(key))
    }

    /// Derives the key for an `http::Request`.
    pub fn build_for<B>(&self, request: &Request<B>) -> Result<CacheKey> {
        self.build(request.method(), request.uri(), request.headers())
    }

    /// Whether every header a response `Vary` names is part of the key.
    ///
    /// A response varying on anything else (including `*`) would be served
    /// to clients it was not produced for.
    pub fn covers_vary(&self, response_headers: &HeaderMap) -> bool {
        response_headers.get_all(header::VARY).iter().all(|value| {
            let Ok(list) = value.to_str() else {
                return false;
            };
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .all(|name| {
                    self.vary_headers
                        .iter()
                        .any(|known| known.as_str().eq_ignore_ascii_case(name))
                })
        })
    }

    // == Prefixes ==
    /// Key prefix shared by every vary-header variant of one resource.
    pub fn resource_prefix(&self, method: &Method, uri: &Uri) -> String {
        let mut prefix = self.path_prefix(method, uri.path());
        push_segment(&mut prefix, &normalize_query(uri.query().unwrap_or("")));
        prefix
    }

    /// Key prefix shared by every query and variant under one path.
    pub fn path_prefix(&self, method: &Method, path: &str) -> String {
        let mut prefix = String::new();
        push_segment(&mut prefix, method.as_str());
        push_segment(&mut prefix, &self.normalize_path(path));
        prefix
    }

    fn normalize_path(&self, path: &str) -> String {
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };

        if self.case_sensitive_paths {
            path.to_string()
        } else {
            path.to_lowercase()
        }
    }
}

/// Sorts query pairs by name, then value. Empty pairs are dropped.
fn normalize_query(query: &str) -> String {
    let mut pairs: Vec<(&str, &str)> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    pairs.sort_unstable();

    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

fn push_segment(out: &mut String, segment: &str) {
    // Writing to a String cannot fail.
    let _ = write!(out, "{}:{}", segment.len(), segment);
}
