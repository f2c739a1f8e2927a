//! API Handlers
//!
//! HTTP request handlers for the weather and cache administration endpoints.

use axum::{
    extract::{FromRef, Query, State},
    http::{Method, Uri},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ResponseCache;
use crate::models::{
    HealthResponse, InvalidateRequest, InvalidateResponse, ObservationRequest,
    ObservationResponse, StatsResponse, WeatherForecast, WeatherQuery,
};
use crate::weather::{ScopedValidator, ValidatorFactory, WeatherService};

/// Path of the cached forecast resource
pub const WEATHER_PATH: &str = "/weather";

/// Application state shared across all handlers.
///
/// Every field is a cheap handle onto state built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Response cache in front of the weather routes
    pub cache: ResponseCache,
    /// Forecast source
    pub weather: WeatherService,
    /// Builds the per-request validator
    pub validators: ValidatorFactory,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            cache,
            weather: WeatherService::new(),
            validators: ValidatorFactory::default(),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ResponseCache::from_config(config))
    }

    /// Replaces the validator factory.
    pub fn with_validators(mut self, validators: ValidatorFactory) -> Self {
        self.validators = validators;
        self
    }
}

impl FromRef<AppState> for ValidatorFactory {
    fn from_ref(state: &AppState) -> Self {
        state.validators.clone()
    }
}

/// Handler for GET /weather?city=<name>
pub async fn forecast_handler(
    State(state): State<AppState>,
    ScopedValidator(validator): ScopedValidator,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Json<WeatherForecast>> {
    validator
        .validate_city(&query.city)
        .map_err(ApiError::Validation)?;

    Ok(Json(state.weather.forecast(&query.city).await))
}

/// Handler for POST /weather
///
/// Records an observation and drops every cached forecast so the next GET
/// sees it.
pub async fn observation_handler(
    State(state): State<AppState>,
    ScopedValidator(validator): ScopedValidator,
    Json(req): Json<ObservationRequest>,
) -> ApiResult<Json<ObservationResponse>> {
    validator
        .validate_city(&req.city)
        .map_err(ApiError::Validation)?;
    validator
        .validate_temperature(req.temperature_c)
        .map_err(ApiError::Validation)?;

    state.weather.record(&req.city, req.temperature_c).await;

    let mut invalidated = 0;
    for method in [Method::GET, Method::HEAD] {
        invalidated += state.cache.invalidate_path(&method, WEATHER_PATH).await;
    }
    info!(city = %req.city, invalidated, "observation recorded");

    Ok(Json(ObservationResponse::new(req.city, invalidated)))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for DELETE /cache
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_all().await;
    info!(removed, "cache cleared");
    Json(InvalidateResponse::new(removed))
}

/// Handler for POST /cache/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> ApiResult<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let method = match &req.method {
        Some(raw) => Method::from_bytes(raw.trim().to_uppercase().as_bytes())
            .map_err(|_| ApiError::InvalidRequest(format!("invalid method '{}'", raw)))?,
        None => Method::GET,
    };
    let uri: Uri = req
        .uri
        .parse()
        .map_err(|_| ApiError::InvalidRequest(format!("invalid uri '{}'", req.uri)))?;

    let removed = state.cache.invalidate_resource(&method, &uri).await;
    info!(method = %method, uri = %uri, removed, "resource invalidated");

    Ok(Json(InvalidateResponse::new(removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
