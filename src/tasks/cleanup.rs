//! Expiry Sweep Task
//!
//! Background task that periodically removes expired responses so that
//! entries nobody asks for again still release their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that sweeps expired entries from `store`.
///
/// The write lock is held only for the sweep itself. The returned handle is
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = ResponseCache::from_config(&config);
/// let sweep = spawn_cleanup_task(cache.store(), 1);
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(
    store: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "expiry sweep removed entries");
            } else {
                debug!(remaining, "expiry sweep found nothing to remove");
            }
        }
    })
}
