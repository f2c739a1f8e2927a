//! Response DTOs
//!
//! Defines the structure of outgoing JSON bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body of `GET /weather`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherForecast {
    pub city: String,
    /// Forecast date (YYYY-MM-DD)
    pub date: String,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: String,
}

/// Response body of `POST /weather`
#[derive(Debug, Clone, Serialize)]
pub struct ObservationResponse {
    pub message: String,
    pub city: String,
    /// Cached forecast variants dropped by the update
    pub invalidated: usize,
}

impl ObservationResponse {
    pub fn new(city: impl Into<String>, invalidated: usize) -> Self {
        let city = city.into();
        Self {
            message: format!("Observation for '{}' recorded", city),
            city,
            invalidated,
        }
    }
}

/// Response body of the invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("{} cache entries invalidated", removed),
            removed,
        }
    }
}

/// Response body of `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        let hit_rate = stats.hit_rate();
        Self { stats, hit_rate }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_flattens_stats() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_miss();
        stats.set_footprint(2, 128);

        let json = serde_json::to_value(StatsResponse::from(stats)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 3);
        assert_eq!(json["total_entries"], 2);
        assert_eq!(json["total_bytes"], 128);
        assert!((json["hit_rate"].as_f64().unwrap() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::new());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_observation_response() {
        let resp = ObservationResponse::new("paris", 2);
        assert!(resp.message.contains("paris"));
        assert_eq!(resp.invalidated, 2);
    }

    #[test]
    fn test_invalidate_response_serialize() {
        let json = serde_json::to_string(&InvalidateResponse::new(3)).unwrap();
        assert!(json.contains("\"removed\":3"));
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let json = serde_json::to_string(&ErrorResponse::new("Something went wrong")).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
