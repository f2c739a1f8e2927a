//! API Module
//!
//! HTTP handlers and routing for the weather service and cache administration.
//!
//! # Endpoints
//! - `GET /weather?city=<name>` - Forecast, served through the response cache
//! - `POST /weather` - Record an observation and invalidate cached forecasts
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Invalidate every entry
//! - `POST /cache/invalidate` - Invalidate every variant of one resource
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
