//! LRU TTL Cache - A bounded in-process key/value cache
//!
//! Combines least-recently-used eviction with optional per-entry TTL
//! expiration. Expired entries are hidden from reads immediately and reclaimed
//! by a background sweeper.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheBuilder, Clock, LruTtlCache, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{ExpiryListener, TracingListener};
