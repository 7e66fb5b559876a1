//! Tidy Cache - an in-process key-value cache
//!
//! Provides capacity-bounded storage with TTL expiry, kept in shape by
//! bounded sweeps that a background watcher schedules on its own.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, CacheStore, Counter, Value};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::Watcher;
