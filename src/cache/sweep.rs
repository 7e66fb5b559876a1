//! Sweep Module
//!
//! The bounded maintenance pass: removes expired entries, then evicts the
//! oldest entries until the store is back within capacity.
//!
//! One budget, the sweep cap, bounds the removals of a pass across both
//! phases. Expired removals are taken first and lower the overflow the
//! capacity phase then has to work off.

use std::hash::Hash;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::cache::{CacheStore, RemovalCause};

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Sweep ==
    /// Runs one bounded sweep. Returns true when no eviction work is owed.
    ///
    /// When nothing was written since the last sweep, the capacity phase is
    /// skipped even if a sweep cap left the store over capacity; only
    /// expiry runs. Such a pass reports false.
    pub fn sweep(&mut self) -> bool {
        self.run_sweep(false)
    }

    /// Sweep that follows one which reported owed work.
    ///
    /// Runs the capacity phase regardless of the dirty flag.
    pub(crate) fn continue_sweep(&mut self) -> bool {
        self.run_sweep(true)
    }

    fn run_sweep(&mut self, continuation: bool) -> bool {
        let mut budget = self.config.effective_sweep_cap();
        let mut fully_swept = true;
        self.stats.record_sweep();

        let (expired, expiry_truncated) = self.sweep_expired(budget);
        budget -= expired;
        if expiry_truncated {
            fully_swept = false;
        }

        let max_entries = self.config.max_entries;
        let overflow = if max_entries > 0 {
            self.entries.len().saturating_sub(max_entries)
        } else {
            0
        };
        let to_evict = overflow.min(budget);
        if to_evict < overflow {
            fully_swept = false;
        }

        if !self.dirty && !continuation {
            if overflow > 0 {
                fully_swept = false;
            }
            trace!(expired, overflow, "Sweep skipped capacity phase: store clean");
            return fully_swept;
        }

        let evicted = match to_evict {
            0 => 0,
            1 => self.evict_oldest(),
            n => self.evict_oldest_n(n),
        };

        self.dirty = false;

        if expired > 0 || evicted > 0 {
            debug!(
                expired,
                evicted,
                remaining = self.entries.len(),
                fully_swept,
                "Sweep removed entries"
            );
        } else {
            trace!(remaining = self.entries.len(), "Sweep found nothing to remove");
        }

        fully_swept
    }

    // == Expiry Phase ==
    /// Removes up to `budget` expired entries.
    ///
    /// Returns how many were removed and whether expired entries were left
    /// behind for lack of budget.
    fn sweep_expired(&mut self, budget: usize) -> (usize, bool) {
        let expiry = self.config.expiry;
        if expiry.is_zero() {
            return (0, false);
        }

        let now = Utc::now();
        let (victims, truncated) = {
            let mut expired = self
                .entries
                .iter()
                .filter(|(_, datum)| datum.is_expired(expiry, now))
                .map(|(key, _)| key.clone());
            let victims: Vec<K> = expired.by_ref().take(budget).collect();
            (victims, expired.next().is_some())
        };

        for key in &victims {
            self.unset(key, RemovalCause::Expired);
        }
        (victims.len(), truncated)
    }

    // == Capacity Phase ==
    /// Evicts the single entry with the oldest set time.
    ///
    /// One linear scan, no allocation. An unset set time wins immediately.
    pub(super) fn evict_oldest(&mut self) -> usize {
        let mut oldest: Option<(&K, DateTime<Utc>)> = None;
        for (key, datum) in &self.entries {
            if datum.is_unset() {
                oldest = Some((key, datum.set_time));
                break;
            }
            match oldest {
                Some((_, set_time)) if set_time <= datum.set_time => {}
                _ => oldest = Some((key, datum.set_time)),
            }
        }

        let Some(victim) = oldest.map(|(key, _)| key.clone()) else {
            return 0;
        };
        self.unset(&victim, RemovalCause::Evicted);
        1
    }

    /// Evicts the `count` entries with the oldest set times.
    pub(super) fn evict_oldest_n(&mut self, count: usize) -> usize {
        let mut by_age: Vec<(K, DateTime<Utc>)> = self
            .entries
            .iter()
            .map(|(key, datum)| (key.clone(), datum.set_time))
            .collect();

        // Newest first; the tail holds the victims.
        by_age.sort_by(|a, b| b.1.cmp(&a.1));

        let keep = by_age.len().saturating_sub(count);
        let mut evicted = 0;
        for (key, _) in by_age.drain(keep..) {
            if self.unset(&key, RemovalCause::Evicted).is_some() {
                evicted += 1;
            }
        }
        evicted
    }
}
