//! Error types for the cache
//!
//! Cache operations themselves never fail. Errors only surface at the edges:
//! loading configuration and joining the background watcher.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An environment variable was set but could not be parsed
    #[error("Invalid configuration: {var}={value:?}")]
    InvalidConfig { var: &'static str, value: String },

    /// The background watcher ended abnormally
    #[error("Watcher error: {0}")]
    Watcher(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
