//! TTL Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock};
use crate::error::{CacheError, Result};
use crate::tasks::ExpiryListener;

// == Sweeper Handle ==
/// Lifecycle control for a running sweeper.
///
/// The sweeper goes from running to stopped exactly once. Stopping it never
/// affects the cache itself.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop at its next wake point.
    ///
    /// Only the first call sends the signal; later calls do nothing.
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            // The task may already be gone if its runtime shut down
            let _ = tx.send(());
        }
    }

    /// Signals shutdown and waits for the task to finish.
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let join = self.join.lock().take();
        if let Some(join) = join {
            let _ = join.await;
        }
    }

    /// Returns true until shutdown has been requested or the task has exited.
    pub fn is_running(&self) -> bool {
        let signalled = self.shutdown_tx.lock().is_none();
        let finished = self
            .join
            .lock()
            .as_ref()
            .map(JoinHandle::is_finished)
            .unwrap_or(true);
        !signalled && !finished
    }
}

/// Spawns a background task that removes expired entries every `period`.
///
/// Each tick locks the store, removes every expired entry, releases the lock
/// and then reports each removed key to `listener`. The first sweep happens
/// one full `period` after spawning.
///
/// # Errors
/// Returns [`CacheError::NoRuntime`] when called outside a tokio runtime and
/// [`CacheError::InvalidSweepInterval`] for a zero `period`.
pub fn spawn_sweeper<K, V>(
    store: Arc<Mutex<CacheStore<K, V>>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    listener: Arc<dyn ExpiryListener<K>>,
) -> Result<SweeperHandle>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    if period.is_zero() {
        return Err(CacheError::InvalidSweepInterval);
    }
    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let join = runtime.spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = {
                        let mut guard = store.lock();
                        guard.remove_expired(clock.now())
                    };

                    for key in &removed {
                        listener.on_expired(key);
                    }

                    if removed.is_empty() {
                        debug!("Expiry sweep: no expired entries found");
                    } else {
                        info!("Expiry sweep: removed {} expired entries", removed.len());
                    }
                }
                // Fires on an explicit signal and when the handle is dropped
                _ = &mut shutdown_rx => {
                    info!("Expiry sweeper stopped");
                    break;
                }
            }
        }
    });

    Ok(SweeperHandle {
        shutdown_tx: Mutex::new(Some(shutdown_tx)),
        join: Mutex::new(Some(join)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::tasks::TracingListener;

    const TICK: Duration = Duration::from_millis(20);

    fn shared_store() -> Arc<Mutex<CacheStore<String, String>>> {
        Arc::new(Mutex::new(CacheStore::new(100)))
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let store = shared_store();
        let clock = ManualClock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        store.lock().insert(
            "expire_soon".to_string(),
            "value".to_string(),
            Duration::from_secs(1),
            clock.now(),
        );

        let handle = spawn_sweeper(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            TICK,
            Arc::new(move |key: &String| sink.lock().push(key.clone())),
        )
        .unwrap();

        clock.advance(Duration::from_secs(2));
        tokio::time::sleep(TICK * 5).await;

        assert!(!store.lock().contains_key("expire_soon"));
        assert_eq!(*seen.lock(), vec!["expire_soon".to_string()]);

        handle.shutdown_and_wait().await;
    }

    #[tokio::test]
    async fn test_sweeper_preserves_valid_entries() {
        let store = shared_store();
        let clock = ManualClock::new();
        {
            let mut guard = store.lock();
            let now = clock.now();
            guard.insert("long_lived".to_string(), "v".to_string(), Duration::from_secs(3600), now);
            guard.insert("forever".to_string(), "v".to_string(), Duration::ZERO, now);
        }

        let handle = spawn_sweeper(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            TICK,
            Arc::new(TracingListener),
        )
        .unwrap();

        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(TICK * 5).await;

        assert_eq!(store.lock().len(), 2);
        handle.shutdown_and_wait().await;
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = shared_store();
        let clock = ManualClock::new();
        let handle = spawn_sweeper(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            TICK,
            Arc::new(TracingListener),
        )
        .unwrap();
        assert!(handle.is_running());

        handle.shutdown_and_wait().await;
        assert!(!handle.is_running());

        // Nothing sweeps once stopped
        let now = clock.now();
        store
            .lock()
            .insert("k".to_string(), "v".to_string(), Duration::from_millis(1), now);
        clock.advance(Duration::from_secs(1));
        tokio::time::sleep(TICK * 5).await;
        assert!(store.lock().contains_key("k"));

        // Repeated shutdown is a no-op
        handle.shutdown();
        handle.shutdown_and_wait().await;
    }

    #[tokio::test]
    async fn test_sweeper_rejects_zero_interval() {
        let result = spawn_sweeper(
            shared_store(),
            Arc::new(ManualClock::new()),
            Duration::ZERO,
            Arc::new(TracingListener),
        );
        assert!(matches!(result, Err(CacheError::InvalidSweepInterval)));
    }

    #[test]
    fn test_sweeper_requires_runtime() {
        let result = spawn_sweeper(
            shared_store(),
            Arc::new(ManualClock::new()),
            TICK,
            Arc::new(TracingListener),
        );
        assert!(matches!(result, Err(CacheError::NoRuntime)));
    }
}
