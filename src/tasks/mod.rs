//! Background Tasks Module
//!
//! Contains the background task that runs alongside a cache instance.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at a configured interval

mod listener;
mod sweeper;

pub use listener::{ExpiryListener, TracingListener};
pub use sweeper::{spawn_sweeper, SweeperHandle};
