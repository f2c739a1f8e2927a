//! Cache Module
//!
//! In-memory response storage with TTL expiration, byte/entry bounds and
//! LRU eviction, plus the request → key derivation.

mod entry;
mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{CacheKey, KeyBuilder};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default bound on the total accounted bytes of the store
pub const DEFAULT_MAX_BYTES: usize = 100 * 1024 * 1024; // 100 MB

/// Default largest response body the middleware will buffer and store
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MB
