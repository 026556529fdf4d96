//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod clock;
mod entry;
mod lru;
mod shared;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruList;
pub use shared::{CacheBuilder, LruTtlCache, DEFAULT_SWEEP_INTERVAL};
pub use store::CacheStore;
