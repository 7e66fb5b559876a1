//! Cache Module
//!
//! In-memory key-value storage with TTL expiry and capacity eviction, the
//! bounded sweep that enforces both, and the shared `Cache` handle.

mod counter;
mod datum;
mod handle;
mod hooks;
mod stats;
mod store;
mod sweep;


// Re-export public types
pub use counter::{Counter, Value};
pub use handle::Cache;
pub use stats::{CacheStats, RemovalCause};
pub use store::CacheStore;

pub(crate) use datum::Datum;
pub(crate) use handle::clean_fully;
pub(crate) use hooks::{DeleteHook, Hooks};
