//! Shared Cache Module
//!
//! Thread-safe cache handle: a [`CacheStore`] behind a single mutex, plus the
//! background expiry sweeper that shares the same lock.

use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheStore, Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, ExpiryListener, SweeperHandle, TracingListener};

/// Sweep interval used when the builder is not given one.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

// == LRU TTL Cache ==
/// Bounded key/value cache with LRU eviction and per-entry TTL.
///
/// Every operation, reads included, takes the same exclusive lock: a `get`
/// reorders recency and may delete an expired entry. Expired entries are
/// never returned; they are removed lazily when read and eagerly by a
/// background sweeper running on the current tokio runtime.
///
/// Share the cache between tasks or threads with an `Arc`. Dropping the cache
/// stops its sweeper.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::LruTtlCache;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache = LruTtlCache::new(2, Duration::from_millis(500));
/// cache.add("k1", 1);
/// cache.add("k2", 2);
/// cache.add("k3", 3); // evicts "k1"
///
/// assert_eq!(cache.get(&"k1"), None);
/// assert_eq!(cache.get(&"k2"), Some(2));
/// # }
/// ```
pub struct LruTtlCache<K, V> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    sweeper: SweeperHandle,
}

impl<K, V> LruTtlCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Send + 'static,
{
    // == Constructors ==
    /// Creates a cache holding at most `capacity` entries, swept every
    /// `sweep_interval`.
    ///
    /// # Panics
    /// Panics if `capacity` or `sweep_interval` is zero, or if called outside
    /// a tokio runtime. Use [`LruTtlCache::builder`] to get these as errors.
    pub fn new(capacity: usize, sweep_interval: Duration) -> Self {
        Self::builder(capacity)
            .sweep_interval(sweep_interval)
            .build()
            .unwrap_or_else(|err| panic!("cannot construct LruTtlCache: {err}"))
    }

    /// Starts a builder for a cache holding at most `capacity` entries.
    ///
    /// Expired keys are logged, which needs `K: Debug`. For other key types
    /// use [`CacheBuilder::with_listener`].
    pub fn builder(capacity: usize) -> CacheBuilder<K, V> {
        CacheBuilder::new(capacity)
    }

    /// Creates a cache from a [`Config`].
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder(config.capacity)
            .sweep_interval(config.sweep_interval())
            .build()
    }
}

impl<K, V> LruTtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    // == Capacity ==
    /// Returns the configured capacity.
    pub fn cap(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Returns the number of stored entries, including expired entries that
    /// have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    // == Clear ==
    /// Drops every entry. The sweeper keeps running.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    // == Add ==
    /// Inserts or updates an entry that never expires.
    pub fn add(&self, key: K, value: V) {
        self.add_with_ttl(key, value, Duration::ZERO);
    }

    /// Inserts or updates an entry that expires `ttl` from now.
    ///
    /// A zero `ttl` means the entry never expires, exactly like [`add`](Self::add).
    /// Note that zero does not mean "expire immediately".
    ///
    /// Updating an existing key replaces its value and expiry and marks it most
    /// recently used. Adding a new key to a full cache first evicts the least
    /// recently used entry, whether or not it has expired.
    pub fn add_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut store = self.store.lock();
        let now = self.clock.now();
        if store.insert(key, value, ttl, now).is_some() {
            debug!("Evicted least recently used entry");
        }
    }

    // == Remove ==
    /// Removes an entry. Returns whether anything was removed.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().remove(key).is_some()
    }

    // == Contains ==
    /// Checks whether `key` is physically stored, without promoting it and
    /// without applying lazy expiry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().contains_key(key)
    }

    // == Time To Live ==
    /// Remaining TTL of a live entry; see [`CacheStore::ttl_remaining`].
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Option<Duration>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.ttl_remaining(key, self.clock.now())
    }

    // == Keys ==
    /// Stored keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.store.lock().keys()
    }

    // == Remove Expired ==
    /// Runs one sweep now and returns the removed keys.
    ///
    /// The expiry listener is not notified for these keys.
    pub fn remove_expired(&self) -> Vec<K> {
        let mut store = self.store.lock();
        store.remove_expired(self.clock.now())
    }

    // == Lifecycle ==
    /// Stops the background sweeper. The cache stays fully usable and expired
    /// entries are still hidden from `get`, but nothing removes them eagerly.
    ///
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        self.sweeper.shutdown();
    }

    /// Stops the background sweeper and waits for it to exit.
    pub async fn shutdown_and_wait(&self) {
        self.sweeper.shutdown_and_wait().await;
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeper_running(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Checks that the key index and recency list agree.
    pub fn is_consistent(&self) -> bool {
        self.store.lock().is_consistent()
    }
}

impl<K, V> LruTtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Get ==
    /// Returns a live value and marks it most recently used.
    ///
    /// An expired entry is removed and reported as missing.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut store = self.store.lock();
        let now = self.clock.now();
        store.get(key, now).cloned()
    }

    // == Peek ==
    /// Returns a live value without changing recency or removing anything.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.peek(key, self.clock.now()).cloned()
    }
}

impl<K, V> Debug for LruTtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruTtlCache")
            .field("capacity", &self.capacity)
            .field("clock", &self.clock)
            .field("sweeper", &self.sweeper)
            .finish_non_exhaustive()
    }
}

impl<K, V> Drop for LruTtlCache<K, V> {
    fn drop(&mut self) {
        self.sweeper.shutdown();
    }
}

// == Cache Builder ==
/// Configures and constructs an [`LruTtlCache`].
pub struct CacheBuilder<K, V> {
    capacity: usize,
    sweep_interval: Duration,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn ExpiryListener<K>>,
    _value: PhantomData<fn() -> V>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Send + 'static,
{
    /// Starts from the system clock, a one second sweep interval and a
    /// listener that logs expired keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            clock: Arc::new(SystemClock),
            listener: Arc::new(TracingListener),
            _value: PhantomData,
        }
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    /// Starts from the system clock and a one second sweep interval, reporting
    /// expired keys to `listener`. Keys need not implement `Debug`.
    pub fn with_listener(capacity: usize, listener: impl ExpiryListener<K> + 'static) -> Self {
        Self {
            capacity,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            clock: Arc::new(SystemClock),
            listener: Arc::new(listener),
            _value: PhantomData,
        }
    }

    pub fn sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Replaces the time source used for TTLs.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the sink notified for each key the sweeper removes.
    pub fn listener(mut self, listener: impl ExpiryListener<K> + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    /// Builds the cache and starts its sweeper on the current tokio runtime.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCapacity`] for a zero capacity
    /// - [`CacheError::InvalidSweepInterval`] for a zero interval
    /// - [`CacheError::NoRuntime`] outside a tokio runtime
    pub fn build(self) -> Result<LruTtlCache<K, V>> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }

        let store = Arc::new(Mutex::new(CacheStore::new(self.capacity)));
        let sweeper = spawn_sweeper(
            Arc::clone(&store),
            Arc::clone(&self.clock),
            self.sweep_interval,
            self.listener,
        )?;

        Ok(LruTtlCache {
            store,
            clock: self.clock,
            capacity: self.capacity,
            sweeper,
        })
    }
}
