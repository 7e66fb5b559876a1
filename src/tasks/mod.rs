//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Watcher: sweeps the store at an interval derived from its policy

mod watcher;

pub use watcher::Watcher;
