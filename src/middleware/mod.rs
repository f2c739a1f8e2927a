//! Middleware Module
//!
//! HTTP response caching in front of a request pipeline.
//!
//! # Flow
//! request → policy check → key → store lookup → hit, or
//! downstream handler → policy check → store insert → response

mod cache_control;
mod layer;
mod policy;

pub use cache_control::CacheControl;
pub use layer::{
    cache_layer, ResponseCache, CACHE_BYPASS, CACHE_HIT, CACHE_MISS, CACHE_STATUS_HEADER,
};
pub use policy::{BypassReason, CachePolicy, RequestDecision};
