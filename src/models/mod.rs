//! Request and Response models for the HTTP API
//!
//! DTOs used for serializing/deserializing HTTP query strings and bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InvalidateRequest, ObservationRequest, WeatherQuery};
pub use responses::{
    ErrorResponse, HealthResponse, InvalidateResponse, ObservationResponse, StatsResponse,
    WeatherForecast,
};
