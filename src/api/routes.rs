//! API Routes
//!
//! Configures the Axum router. Only the weather routes sit behind the
//! response cache; administration and health endpoints always run.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    forecast_handler, health_handler, invalidate_all_handler, invalidate_handler,
    observation_handler, stats_handler, AppState, WEATHER_PATH,
};
use crate::middleware::cache_layer;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /weather?city=<name>` - Forecast (cached)
/// - `POST /weather` - Record an observation (bypasses the cache)
/// - `GET /cache/stats` - Cache statistics
/// - `DELETE /cache` - Invalidate every entry
/// - `POST /cache/invalidate` - Invalidate one resource
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cached = Router::new()
        .route(WEATHER_PATH, get(forecast_handler).post(observation_handler))
        .route_layer(from_fn_with_state(state.cache.clone(), cache_layer));

    Router::new()
        .merge(cached)
        .route("/cache/stats", get(stats_handler))
        .route("/cache", delete(invalidate_all_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::middleware::{CACHE_BYPASS, CACHE_HIT, CACHE_MISS, CACHE_STATUS_HEADER};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint_not_cached() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/cache/stats")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CACHE_STATUS_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_weather_miss_then_hit() {
        let app = create_test_app();

        let first = app
            .clone()
            .oneshot(get_request("/weather?city=paris"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[CACHE_STATUS_HEADER], CACHE_MISS);

        let second = app
            .oneshot(get_request("/weather?city=paris"))
            .await
            .unwrap();
        assert_eq!(second.headers()[CACHE_STATUS_HEADER], CACHE_HIT);
    }

    #[tokio::test]
    async fn test_weather_post_bypasses() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/weather")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"city":"paris","temperature_c":20}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_STATUS_HEADER], CACHE_BYPASS);
    }

    #[tokio::test]
    async fn test_invalid_city_is_not_cached() {
        let app = create_test_app();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get_request("/weather?city=p4ris"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(response.headers()[CACHE_STATUS_HEADER], CACHE_MISS);
        }
    }
}
