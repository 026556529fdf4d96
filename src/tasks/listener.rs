//! Expiry Listener
//!
//! Sink notified for every key the background sweeper removes.

use std::fmt::Debug;

use tracing::info;

/// Receives one notification per key removed by the expiry sweeper.
///
/// Called after the cache lock has been released, so implementations may
/// call back into the cache.
pub trait ExpiryListener<K>: Send + Sync {
    fn on_expired(&self, key: &K);
}

/// Default listener: logs each expired key through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl<K: Debug> ExpiryListener<K> for TracingListener {
    fn on_expired(&self, key: &K) {
        info!(key = ?key, "Removing expired entry");
    }
}

impl<K, F> ExpiryListener<K> for F
where
    F: Fn(&K) + Send + Sync,
{
    fn on_expired(&self, key: &K) {
        self(key)
    }
}
