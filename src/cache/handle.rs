//! Cache Handle Module
//!
//! `Cache` owns the lock around a `CacheStore` and the background watcher
//! that keeps it swept.
//!
//! Every mutator and both cleaning entry points hold the write lock for
//! their whole duration, so writes and maintenance never interleave. Reads
//! share the read lock. Deletion hooks run inside the write critical section.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStats, CacheStore, Counter};
use crate::config::Config;
use crate::error::Result;
use crate::tasks::Watcher;

/// Runs sweeps until one reports that no eviction work is owed.
///
/// The write lock is taken per pass, so other callers get in between. Every
/// pass after the first runs the capacity phase even on a clean store, since
/// the pass before it reported owed work.
pub(crate) async fn clean_fully<K, V>(store: &RwLock<CacheStore<K, V>>)
where
    K: Eq + Hash + Clone,
{
    let mut fully_swept = store.write().await.sweep();
    while !fully_swept {
        fully_swept = store.write().await.continue_sweep();
    }
}

// == Cache ==
/// Thread-safe cache handle. Share it across tasks via `Arc<Cache<K, V>>`.
///
/// # Example
/// ```ignore
/// let cache: Cache<String, i64> = Cache::new(
///     Config::default()
///         .with_max_entries(10_000)
///         .with_expiry(Duration::from_secs(300)),
/// );
/// cache.insert("hits".to_string(), 0).await;
/// cache.increment("hits".to_string(), false).await;
/// cache.shutdown().await?;
/// ```
pub struct Cache<K, V> {
    store: Arc<RwLock<CacheStore<K, V>>>,
    watcher: Option<Watcher>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache and starts its background watcher.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn new(config: Config) -> Self {
        Self::from_store(CacheStore::new(config))
    }

    /// Creates a cache without a watcher; call `clean`/`clean_fully`
    /// yourself.
    pub fn unwatched(config: Config) -> Self {
        Self::from_store_unwatched(CacheStore::new(config))
    }

    /// Shares a prepared store (hooks installed, entries loaded) and starts
    /// the watcher.
    pub fn from_store(store: CacheStore<K, V>) -> Self {
        let config = store.config();
        let store = Arc::new(RwLock::new(store));
        let watcher = Watcher::spawn(store.clone());
        info!(
            max_entries = config.max_entries,
            expiry_ms = config.expiry.as_millis() as u64,
            "Cache started with background watcher"
        );
        Self {
            store,
            watcher: Some(watcher),
        }
    }

    pub fn from_store_unwatched(store: CacheStore<K, V>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            watcher: None,
        }
    }

    // == Mutators ==

    pub async fn insert(&self, key: K, value: V) {
        self.store.write().await.insert(key, value);
    }

    pub async fn insert_at(&self, key: K, value: V, set_time: DateTime<Utc>) {
        self.store.write().await.insert_at(key, value, set_time);
    }

    pub async fn insert_if_absent(&self, key: K, value: V) -> bool {
        self.store.write().await.insert_if_absent(key, value)
    }

    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.write().await.remove(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn increment(&self, key: K, touch: bool) -> i64
    where
        V: Counter,
    {
        self.store.write().await.increment(key, touch)
    }

    pub async fn decrement(&self, key: K, touch: bool) -> i64
    where
        V: Counter,
    {
        self.store.write().await.decrement(key, touch)
    }

    pub async fn filter<F>(&self, predicate: F)
    where
        F: FnMut(&K, &V, DateTime<Utc>) -> bool,
    {
        self.store.write().await.filter(predicate);
    }

    pub async fn transform<F>(&self, f: F)
    where
        F: FnMut(&K, &V, DateTime<Utc>) -> V,
        V: PartialEq,
    {
        self.store.write().await.transform(f);
    }

    pub async fn drain<F>(&self, callback: F)
    where
        F: FnMut(K, V, DateTime<Utc>),
    {
        self.store.write().await.drain(callback);
    }

    // == Reads ==

    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.store.read().await.get(key)
    }

    pub async fn get_with_time<Q>(&self, key: &Q) -> Option<(V, DateTime<Utc>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.store.read().await.get_with_time(key)
    }

    pub async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.read().await.contains(key)
    }

    pub async fn keys(&self) -> Vec<K> {
        self.store.read().await.keys()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn config(&self) -> Config {
        self.store.read().await.config()
    }

    // == Maintenance ==
    /// Runs one bounded sweep. Returns true when no eviction work is owed.
    pub async fn clean(&self) -> bool {
        self.store.write().await.sweep()
    }

    /// Sweeps until the store is within its limits.
    pub async fn clean_fully(&self) {
        clean_fully(&self.store).await;
    }

    // == Option Setters ==

    pub async fn set_max_entries(&self, max_entries: usize) {
        self.store.write().await.set_max_entries(max_entries);
    }

    pub async fn set_expiry(&self, expiry: Duration) {
        self.store.write().await.set_expiry(expiry);
    }

    pub async fn set_sweep_interval(&self, sweep_interval: Duration) {
        self.store.write().await.set_sweep_interval(sweep_interval);
    }

    pub async fn set_sweep_cap(&self, sweep_cap: usize) {
        self.store.write().await.set_sweep_cap(sweep_cap);
    }

    pub async fn set_pre_delete<F>(&self, hook: F)
    where
        F: Fn(&K, &V, DateTime<Utc>) + Send + Sync + 'static,
    {
        self.store.write().await.set_pre_delete(hook);
    }

    pub async fn set_post_delete<F>(&self, hook: F)
    where
        F: Fn(&K, &V, DateTime<Utc>) + Send + Sync + 'static,
    {
        self.store.write().await.set_post_delete(hook);
    }

    pub async fn clear_hooks(&self) {
        self.store.write().await.clear_hooks();
    }

    // == Shutdown ==
    /// Stops the watcher and waits for it to finish.
    ///
    /// Fails if the watcher died abnormally, for example because a deletion
    /// hook panicked during a background sweep.
    pub async fn shutdown(mut self) -> Result<()> {
        match self.watcher.take() {
            Some(watcher) => watcher.stop().await,
            None => Ok(()),
        }
    }
}

impl<K, V> Drop for Cache<K, V> {
    fn drop(&mut self) {
        if let Some(watcher) = &self.watcher {
            watcher.signal_stop();
        }
    }
}
