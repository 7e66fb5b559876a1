//! Cache Store Module
//!
//! The entry map, its dirty flag, the eviction policy and every mutator.
//! The store itself is not synchronized; `Cache` puts it behind a lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{CacheStats, Counter, Datum, Hooks, RemovalCause};
use crate::config::Config;

// == Cache Store ==
/// Key-value storage with TTL expiry and capacity eviction.
///
/// Mutators never evict on their own. Expired and excess entries are removed
/// by `sweep`, which the background watcher calls on a schedule.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    pub(crate) entries: HashMap<K, Datum<V>>,
    /// Set by every write, cleared by a sweep that ran its capacity phase
    pub(crate) dirty: bool,
    /// Eviction policy
    pub(crate) config: Config,
    /// Removal callbacks
    pub(crate) hooks: Hooks<K, V>,
    /// Maintenance statistics
    pub(crate) stats: CacheStats,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty store with the given policy.
    pub fn new(config: Config) -> Self {
        Self {
            entries: HashMap::new(),
            dirty: false,
            config,
            hooks: Hooks::default(),
            stats: CacheStats::new(),
        }
    }

    // == Insert ==
    /// Stores a value stamped with the current time.
    ///
    /// An existing entry under the same key is removed first, firing the
    /// deletion hooks.
    pub fn insert(&mut self, key: K, value: V) {
        self.unset(&key, RemovalCause::Replaced);
        self.entries.insert(key, Datum::new(value));
        self.dirty = true;
    }

    /// Stores a value with an explicit timestamp.
    pub fn insert_at(&mut self, key: K, value: V, set_time: DateTime<Utc>) {
        self.unset(&key, RemovalCause::Replaced);
        self.entries.insert(key, Datum::with_set_time(value, set_time));
        self.dirty = true;
    }

    /// Stores a value only if the key is absent. Returns whether it did.
    ///
    /// An expired entry that no sweep has removed yet still counts as
    /// present, even though `get` and `contains` already hide it.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, Datum::new(value));
        self.dirty = true;
        true
    }

    // == Remove ==
    /// Removes an entry, firing the deletion hooks.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let datum = self.unset(key, RemovalCause::Explicit)?;
        self.dirty = true;
        Some(datum.value)
    }

    // == Clear ==
    /// Removes every entry, firing the deletion hooks for each.
    pub fn clear(&mut self) {
        let keys: Vec<K> = self.entries.keys().cloned().collect();
        for key in &keys {
            self.unset(key, RemovalCause::Explicit);
        }
        self.dirty = true;
    }

    // == Counters ==
    /// Adds one to the counter under `key` and returns the new count.
    ///
    /// A missing key or a value that is not a count starts from zero; the
    /// old value is overwritten. `touch` refreshes the set time of an
    /// existing entry. Arithmetic wraps on overflow.
    pub fn increment(&mut self, key: K, touch: bool) -> i64
    where
        V: Counter,
    {
        self.add_count(key, 1, touch)
    }

    /// Subtracts one from the counter under `key` and returns the new count.
    pub fn decrement(&mut self, key: K, touch: bool) -> i64
    where
        V: Counter,
    {
        self.add_count(key, -1, touch)
    }

    fn add_count(&mut self, key: K, delta: i64, touch: bool) -> i64
    where
        V: Counter,
    {
        let datum = self
            .entries
            .entry(key)
            .or_insert_with(|| Datum::new(V::from_count(0)));
        let count = datum.value.count().unwrap_or(0).wrapping_add(delta);
        datum.value = V::from_count(count);
        if touch {
            datum.touch();
        }
        self.dirty = true;
        count
    }

    // == Filter ==
    /// Keeps only the entries for which `predicate` returns true.
    ///
    /// Rejected entries go through the removal path and fire the hooks.
    pub fn filter<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&K, &V, DateTime<Utc>) -> bool,
    {
        let rejected: Vec<K> = self
            .entries
            .iter()
            .filter(|&(key, datum)| !predicate(key, &datum.value, datum.set_time))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &rejected {
            self.unset(key, RemovalCause::Explicit);
        }
        self.dirty = true;
    }

    // == Transform ==
    /// Rewrites every value with `f`.
    ///
    /// Values that come back changed get a fresh datum stamped now; the old
    /// set time is dropped. Unchanged values keep theirs. No hooks fire.
    pub fn transform<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V, DateTime<Utc>) -> V,
        V: PartialEq,
    {
        for (key, datum) in self.entries.iter_mut() {
            let value = f(key, &datum.value, datum.set_time);
            if value != datum.value {
                *datum = Datum::new(value);
            }
        }
        self.dirty = true;
    }

    // == Drain ==
    /// Hands every entry to `callback` and empties the store.
    ///
    /// This bypasses the removal path: deletion hooks do not fire.
    pub fn drain<F>(&mut self, mut callback: F)
    where
        F: FnMut(K, V, DateTime<Utc>),
    {
        self.stats.record_drained(self.entries.len());
        for (key, datum) in self.entries.drain() {
            callback(key, datum.value, datum.set_time);
        }
        self.dirty = true;
    }

    // == Removal Path ==
    /// Removes one entry: `pre_delete`, delete, `post_delete`.
    ///
    /// Every removal except `drain` goes through here. Does not touch the
    /// dirty flag; callers decide.
    pub(crate) fn unset<Q>(&mut self, key: &Q, cause: RemovalCause) -> Option<Datum<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(pre_delete) = &self.hooks.pre_delete {
            let (key, datum) = self.entries.get_key_value(key)?;
            pre_delete(key, &datum.value, datum.set_time);
        }

        let (key, datum) = self.entries.remove_entry(key)?;

        if let Some(post_delete) = &self.hooks.post_delete {
            post_delete(&key, &datum.value, datum.set_time);
        }

        self.stats.record_removal(cause);
        Some(datum)
    }

    // == Reads ==
    /// Returns the value under `key` unless it is missing or expired.
    ///
    /// Expired entries stay in the store until the next sweep but are not
    /// returned.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.live(key).map(|datum| datum.value.clone())
    }

    /// Like `get`, also returning the entry's set time.
    pub fn get_with_time<Q>(&self, key: &Q) -> Option<(V, DateTime<Utc>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.live(key).map(|datum| (datum.value.clone(), datum.set_time))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live(key).is_some()
    }

    /// Keys of all unexpired entries, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|(_, datum)| !datum.is_expired(self.config.expiry, now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn live<Q>(&self, key: &Q) -> Option<&Datum<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|datum| !datum.is_expired(self.config.expiry, Utc::now()))
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones that no
    /// sweep has removed yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the store changed since the last completed sweep.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn config(&self) -> Config {
        self.config
    }

    // == Option Setters ==
    // Each marks the store dirty so the next sweep re-evaluates capacity.

    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.config.max_entries = max_entries;
        self.dirty = true;
    }

    pub fn set_expiry(&mut self, expiry: Duration) {
        self.config.expiry = expiry;
        self.dirty = true;
    }

    pub fn set_sweep_interval(&mut self, sweep_interval: Duration) {
        self.config.sweep_interval = sweep_interval;
        self.dirty = true;
    }

    pub fn set_sweep_cap(&mut self, sweep_cap: usize) {
        self.config.sweep_cap = sweep_cap;
        self.dirty = true;
    }

    /// Installs the hook run before each removal.
    pub fn set_pre_delete<F>(&mut self, hook: F)
    where
        F: Fn(&K, &V, DateTime<Utc>) + Send + Sync + 'static,
    {
        self.hooks.pre_delete = Some(Arc::new(hook));
        self.dirty = true;
    }

    /// Installs the hook run after each removal.
    pub fn set_post_delete<F>(&mut self, hook: F)
    where
        F: Fn(&K, &V, DateTime<Utc>) + Send + Sync + 'static,
    {
        self.hooks.post_delete = Some(Arc::new(hook));
        self.dirty = true;
    }

    /// Drops both deletion hooks.
    pub fn clear_hooks(&mut self) {
        self.hooks = Hooks::default();
        self.dirty = true;
    }
}
