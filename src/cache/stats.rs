//! Cache Statistics Module
//!
//! Counts removals by cause and maintenance passes.

use serde::Serialize;

/// Why an entry left the store through the removal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// `remove`, `clear` or a rejecting `filter`
    Explicit,
    /// Overwritten by `insert`
    Replaced,
    /// Aged past the expiry during a sweep
    Expired,
    /// Removed by a sweep to bring the store within capacity
    Evicted,
}

// == Cache Stats ==
/// Tracks cache maintenance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries removed by `remove`, `clear` or `filter`
    pub removals: u64,
    /// Entries overwritten by `insert`
    pub replacements: u64,
    /// Entries removed by the expiry phase of a sweep
    pub expirations: u64,
    /// Entries removed by the capacity phase of a sweep
    pub evictions: u64,
    /// Entries handed out by `drain`
    pub drained: u64,
    /// Completed sweeps
    pub sweeps: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Removal ==
    /// Counts one removal under its cause.
    pub fn record_removal(&mut self, cause: RemovalCause) {
        match cause {
            RemovalCause::Explicit => self.removals += 1,
            RemovalCause::Replaced => self.replacements += 1,
            RemovalCause::Expired => self.expirations += 1,
            RemovalCause::Evicted => self.evictions += 1,
        }
    }

    pub fn record_drained(&mut self, count: usize) {
        self.drained += count as u64;
    }

    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
