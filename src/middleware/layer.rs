//! Response caching middleware
//!
//! Mounted with `axum::middleware::from_fn_with_state(cache, cache_layer)`.
//! Cache failures never change the outcome of a request: the worst case is
//! serving a miss that could have been a hit.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{header, response::Parts, HeaderValue, Method, Uri},
    middleware::Next,
    response::Response,
};
use futures::stream;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::policy::{CachePolicy, RequestDecision};
use crate::cache::{CacheEntry, CacheKey, CacheStats, CacheStore, KeyBuilder};
use crate::config::Config;

/// Header reporting how the cache handled the request.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

pub const CACHE_HIT: &str = "HIT";
pub const CACHE_MISS: &str = "MISS";
pub const CACHE_BYPASS: &str = "BYPASS";

// == Response Cache ==
/// Cloneable handle to the shared store, key builder and policy.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<RwLock<CacheStore>>,
    keys: Arc<KeyBuilder>,
    policy: Arc<CachePolicy>,
}

impl ResponseCache {
    pub fn new(store: CacheStore, keys: KeyBuilder, policy: CachePolicy) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            keys: Arc::new(keys),
            policy: Arc::new(policy),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CacheStore::new(config.max_entries, config.max_bytes),
            KeyBuilder::new(config.vary_headers.clone(), config.case_sensitive_paths),
            CachePolicy::from_config(config),
        )
    }

    /// Shared store handle, e.g. for the background sweep.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    pub fn key_builder(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.store.write().await.get(key)
    }

    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.store.write().await.invalidate(key)
    }

    /// Drops every cached variant of `method uri`, whatever its vary headers.
    pub async fn invalidate_resource(&self, method: &Method, uri: &Uri) -> usize {
        let prefix = self.keys.resource_prefix(method, uri);
        self.store.write().await.invalidate_prefix(&prefix)
    }

    /// Drops every cached response under `method path`, any query.
    pub async fn invalidate_path(&self, method: &Method, path: &str) -> usize {
        let prefix = self.keys.path_prefix(method, path);
        self.store.write().await.invalidate_prefix(&prefix)
    }

    pub async fn invalidate_all(&self) -> usize {
        self.store.write().await.invalidate_all()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}

// == Middleware ==
/// Serves cacheable requests from the store and stores cacheable responses.
pub async fn cache_layer(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if let RequestDecision::Bypass(reason) =
        cache.policy.check_request(request.method(), request.headers())
    {
        debug!(method = %request.method(), uri = %request.uri(), reason = reason.as_str(), "cache bypass");
        return with_cache_status(next.run(request).await, CACHE_BYPASS);
    }

    let key = match cache.keys.build_for(&request) {
        Ok(key) => key,
        Err(err) => {
            warn!(uri = %request.uri(), error = %err, "cache key derivation failed, bypassing");
            return with_cache_status(next.run(request).await, CACHE_BYPASS);
        }
    };

    // The lock guard is dropped at the end of this statement, before any
    // downstream work.
    let cached = cache.store.write().await.get(&key);
    if let Some(entry) = cached {
        debug!(key = %key, "cache hit");
        let mut response = with_cache_status(entry.to_response(), CACHE_HIT);
        response
            .headers_mut()
            .insert(header::AGE, HeaderValue::from(entry.age_secs()));
        return response;
    }

    debug!(key = %key, "cache miss");
    let response = next.run(request).await;
    with_cache_status(store_response(&cache, key, response).await, CACHE_MISS)
}

/// Buffers and stores `response` when the policy allows it, returning the
/// response to send either way.
async fn store_response(cache: &ResponseCache, key: CacheKey, response: Response) -> Response {
    let Some(ttl) = cache.policy.response_ttl(response.status(), response.headers()) else {
        return response;
    };

    if !cache.keys.covers_vary(response.headers()) {
        debug!(key = %key, "response varies on headers outside the key, not caching");
        return response;
    }

    let max_body = cache.policy.max_body_bytes();
    let fits = matches!(response.body().size_hint().upper(), Some(upper) if upper <= max_body as u64);
    if !fits {
        debug!(key = %key, "response body too large or unsized, not caching");
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, max_body).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(key = %key, error = %err, "downstream body failed, not caching");
            return with_failed_body(parts, err);
        }
    };

    let entry = CacheEntry::new(key, parts.status, &parts.headers, bytes.clone(), ttl);
    let entry_key = entry.key.clone();
    if let Err(err) = cache.store.write().await.put(entry) {
        warn!(key = %entry_key, error = %err, "failed to store response, serving uncached");
    } else {
        debug!(key = %entry_key, ttl_secs = ttl.as_secs(), "stored response");
    }

    Response::from_parts(parts, Body::from(bytes))
}

/// Rebuilds a downstream response whose body failed while being buffered.
///
/// Status and headers are kept and the body yields the same error, so the
/// client sees the downstream failure exactly as if it had been streamed.
fn with_failed_body(parts: Parts, err: axum::Error) -> Response {
    let body = Body::from_stream(stream::once(async move { Err::<Bytes, _>(err) }));
    Response::from_parts(parts, body)
}

fn with_cache_status(mut response: Response, status: &'static str) -> Response {
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn cache(max_entries: usize, max_bytes: usize, max_body: usize) -> ResponseCache {
        ResponseCache::new(
            CacheStore::new(max_entries, max_bytes),
            KeyBuilder::new(vec![header::ACCEPT], false),
            CachePolicy::new(
                vec![Method::GET, Method::HEAD],
                [StatusCode::OK],
                Duration::from_secs(60),
                max_body,
            ),
        )
    }

    fn app(cache: ResponseCache, calls: Arc<AtomicUsize>, body: &'static str) -> Router {
        Router::new()
            .route(
                "/data",
                get(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        body
                    }
                }),
            )
            .layer(from_fn_with_state(cache, cache_layer))
    }

    fn request(uri: &str) -> Request {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_request_is_a_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = app(cache(10, 10_000, 1024), Arc::clone(&calls), "hello");

        let first = app.clone().oneshot(request("/data")).await.unwrap();
        assert_eq!(first.headers()[CACHE_STATUS_HEADER], CACHE_MISS);

        let second = app.oneshot(request("/data")).await.unwrap();
        assert_eq!(second.headers()[CACHE_STATUS_HEADER], CACHE_HIT);
        assert!(second.headers().contains_key(header::AGE));
        let body = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oversized_body_is_served_but_not_stored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache(10, 10_000, 4);
        let app = app(cache.clone(), Arc::clone(&calls), "longer than four");

        let first = app.clone().oneshot(request("/data")).await.unwrap();
        let body = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "longer than four");

        app.oneshot(request("/data")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_store_rejection_degrades_to_pass_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        // max_bytes too small for any entry
        let cache = cache(10, 8, 1024);
        let app = app(cache.clone(), Arc::clone(&calls), "hello");

        for _ in 0..2 {
            let response = app.clone().oneshot(request("/data")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[CACHE_STATUS_HEADER], CACHE_MISS);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().await.rejections, 2);
    }

    #[tokio::test]
    async fn test_invalid_vary_header_bypasses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache(10, 10_000, 1024);
        let app = app(cache.clone(), Arc::clone(&calls), "hello");

        let mut req = request("/data");
        req.headers_mut()
            .insert(header::ACCEPT, HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], CACHE_BYPASS);
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_invalidate_resource_drops_all_variants() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cache(10, 10_000, 1024);
        let app = app(cache.clone(), Arc::clone(&calls), "hello");

        for accept in ["application/json", "text/plain"] {
            let mut req = request("/data?x=1");
            req.headers_mut()
                .insert(header::ACCEPT, HeaderValue::from_static(accept));
            app.clone().oneshot(req).await.unwrap();
        }
        assert_eq!(cache.stats().await.total_entries, 2);

        let removed = cache
            .invalidate_resource(&Method::GET, &"/data?x=1".parse().unwrap())
            .await;
        assert_eq!(removed, 2);
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_failed_body_keeps_downstream_response() {
        let (mut parts, _) = Response::new(Body::empty()).into_parts();
        parts.status = StatusCode::OK;
        parts
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = with_failed_body(parts, axum::Error::new("connection reset"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
        assert!(to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[tokio::test]
    async fn test_uncovered_vary_is_not_stored() {
        let cache = cache(10, 10_000, 1024);
        let app = Router::new()
            .route(
                "/greeting",
                get(|| async { ([(header::VARY, "accept-language")], "bonjour") }),
            )
            .layer(from_fn_with_state(cache.clone(), cache_layer));

        let response = app.oneshot(request("/greeting")).await.unwrap();
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], CACHE_MISS);
        assert_eq!(cache.stats().await.total_entries, 0);
    }
}
