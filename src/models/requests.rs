//! Request DTOs
//!
//! Defines the structure of incoming query strings and JSON bodies.

use serde::Deserialize;

/// Query string of `GET /weather`
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherQuery {
    /// City to forecast
    #[serde(default)]
    pub city: String,
}

/// Request body of `POST /weather`
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRequest {
    /// City the observation belongs to
    pub city: String,
    /// Observed temperature in degrees Celsius
    pub temperature_c: i32,
}

/// Request body of `POST /cache/invalidate`
///
/// Every cached variant of `method uri` is dropped, whatever vary headers
/// it was stored under.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Request method, `GET` when omitted
    #[serde(default)]
    pub method: Option<String>,
    /// Path and query, e.g. `/weather?city=paris`
    pub uri: String,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !self.uri.starts_with('/') {
            return Some("uri must be an absolute path, e.g. /weather?city=paris".to_string());
        }
        if let Some(method) = &self.method {
            if method.trim().is_empty() {
                return Some("method cannot be empty".to_string());
            }
        }
        None
    }
}
