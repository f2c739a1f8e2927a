//! Cache Entry Module
//!
//! Defines a stored HTTP response together with its TTL metadata.

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

use crate::cache::CacheKey;

// == Cache Entry ==
/// A captured response with creation and expiration timestamps.
///
/// Entries are never mutated after insertion; an update replaces the
/// whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Key the entry is stored under
    pub key: CacheKey,
    /// Response status code
    pub status: StatusCode,
    /// Response headers in the order they were produced
    pub headers: Vec<(HeaderName, HeaderValue)>,
    /// Response body
    pub body: Bytes,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Accounted size: key, headers and body
    pub size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Captures a response that expires `ttl` from now.
    pub fn new(
        key: CacheKey,
        status: StatusCode,
        headers: &HeaderMap,
        body: Bytes,
        ttl: Duration,
    ) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        let headers: Vec<(HeaderName, HeaderValue)> = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let header_bytes: usize = headers
            .iter()
            .map(|(name, value)| name.as_str().len() + value.len())
            .sum();
        let size = key.len() + header_bytes + body.len();

        Self {
            key,
            status,
            headers,
            body,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
            size,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero TTL yields an entry that is already expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    /// Remaining lifetime in whole seconds.
    pub fn ttl_remaining(&self) -> u64 {
        self.ttl_remaining_ms() / 1000
    }

    /// Seconds since the entry was captured, for the `Age` header.
    pub fn age_secs(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.created_at) / 1000
    }

    // == To Response ==
    /// Rebuilds the stored response: same status, headers in stored order,
    /// same body.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            headers.append(name.clone(), value.clone());
        }

        response
    }
}

// == Utility Functions ==
/// Returns the current time as Unix milliseconds.
///
/// The wall clock is read once; later readings advance with a monotonic
/// clock, so adjusting the system time never stretches or shortens a TTL.
pub fn current_timestamp_ms() -> u64 {
    static ANCHOR: OnceLock<(Instant, u64)> = OnceLock::new();

    let (started, unix_ms) = ANCHOR.get_or_init(|| {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        (Instant::now(), unix_ms)
    });

    unix_ms.saturating_add(started.elapsed().as_millis() as u64)
}
