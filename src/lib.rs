//! Mini Response Cache - HTTP response caching middleware for axum
//!
//! Stores complete responses in memory keyed by method, normalized path,
//! sorted query and a configured set of request headers, with TTL expiry,
//! LRU eviction and byte/entry bounds. A small weather service is served
//! behind it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod tasks;
pub mod weather;

pub use api::{create_router, AppState};
pub use config::Config;
pub use middleware::{cache_layer, ResponseCache};
pub use tasks::spawn_cleanup_task;
