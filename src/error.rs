//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Lookups never fail; only
//! construction can report an error.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must hold at least one entry
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// Sweep interval must be a positive duration
    #[error("Invalid sweep interval: must be greater than zero")]
    InvalidSweepInterval,

    /// The background sweeper needs a tokio runtime to be spawned on
    #[error("No tokio runtime available to spawn the expiry sweeper")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
