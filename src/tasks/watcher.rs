//! Sweep Watcher Task
//!
//! Background task that keeps a store swept. It re-reads the interval from
//! the store's policy, so runtime changes take effect on the next round.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::cache::{clean_fully, CacheStore};
use crate::error::{CacheError, Result};

/// Handle to a running watcher task.
///
/// The task stops when `stop` or `signal_stop` is called, or when the
/// handle is dropped.
#[derive(Debug)]
pub struct Watcher {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Watcher {
    /// Spawns a watcher for `store`.
    ///
    /// Each round reads the sweep interval (explicit, or a tenth of the
    /// expiry clamped to `[1µs, 1min]`). Each pass sleeps for the interval
    /// minus the time the previous pass took, then cleans fully. If writes
    /// landed during the pass the next pass keeps the same interval;
    /// otherwise the interval is read again.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    ///
    /// # Example
    /// ```ignore
    /// let store = Arc::new(RwLock::new(CacheStore::new(config)));
    /// let watcher = Watcher::spawn(store.clone());
    /// // Later, during shutdown:
    /// watcher.stop().await?;
    /// ```
    pub fn spawn<K, V>(store: Arc<RwLock<CacheStore<K, V>>>) -> Self
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(store, shutdown_rx));
        Self { handle, shutdown }
    }

    /// Asks the task to stop without waiting for it.
    pub fn signal_stop(&self) {
        // The receiver is gone only if the task already ended.
        let _ = self.shutdown.send(true);
    }

    /// Stops the task and waits for it to finish.
    pub async fn stop(self) -> Result<()> {
        self.signal_stop();
        self.handle
            .await
            .map_err(|e| CacheError::Watcher(e.to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run<K, V>(store: Arc<RwLock<CacheStore<K, V>>>, mut shutdown: watch::Receiver<bool>)
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    info!("Starting cache watcher");
    let mut previous_pass = Duration::ZERO;

    loop {
        let interval = store.read().await.config().effective_sweep_interval();
        debug!(interval_us = interval.as_micros() as u64, "Watcher sweep interval");

        loop {
            let sleep_for = interval.saturating_sub(previous_pass);
            if !sleep_for.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {}
                    _ = shutdown.changed() => {
                        info!("Cache watcher stopped");
                        return;
                    }
                }
            }
            if *shutdown.borrow() {
                info!("Cache watcher stopped");
                return;
            }

            let started = Instant::now();
            clean_fully(&store).await;
            previous_pass = started.elapsed();
            trace!(pass_us = previous_pass.as_micros() as u64, "Watcher pass complete");

            if !store.read().await.is_dirty() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{TimeDelta, Utc};
    use tokio_test::{assert_err, assert_ok};

    fn shared(config: Config) -> Arc<RwLock<CacheStore<String, String>>> {
        Arc::new(RwLock::new(CacheStore::new(config)))
    }

    #[tokio::test]
    async fn test_watcher_removes_expired_entries() {
        let store = shared(Config::default().with_expiry(Duration::from_millis(50)));
        store
            .write()
            .await
            .insert("expire_soon".to_string(), "value".to_string());

        let watcher = Watcher::spawn(store.clone());

        // Wait for entry to expire and a pass to run
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(
            store.read().await.is_empty(),
            "Expired entry should have been swept"
        );
        assert_ok!(watcher.stop().await);
    }

    #[tokio::test]
    async fn test_watcher_preserves_valid_entries() {
        let config = Config::default()
            .with_expiry(Duration::from_secs(3600))
            .with_sweep_interval(Duration::from_millis(10));
        let store = shared(config);
        store
            .write()
            .await
            .insert("long_lived".to_string(), "value".to_string());

        let watcher = Watcher::spawn(store.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(
            store.read().await.get("long_lived"),
            Some("value".to_string())
        );
        assert!(store.read().await.stats().sweeps > 0);
        assert_ok!(watcher.stop().await);
    }

    #[tokio::test]
    async fn test_watcher_enforces_capacity() {
        let config = Config::default()
            .with_max_entries(2)
            .with_sweep_cap(1)
            .with_sweep_interval(Duration::from_millis(10));
        let store = shared(config);
        {
            let mut guard = store.write().await;
            let base = Utc::now() - TimeDelta::hours(1);
            for i in 0..6 {
                guard.insert_at(
                    format!("key{}", i),
                    "value".to_string(),
                    base + TimeDelta::seconds(i),
                );
            }
        }

        let watcher = Watcher::spawn(store.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;

        {
            let guard = store.read().await;
            assert_eq!(guard.len(), 2);
            assert!(guard.contains("key4"));
            assert!(guard.contains("key5"));
        }
        assert_ok!(watcher.stop().await);
    }

    #[tokio::test]
    async fn test_watcher_can_be_stopped() {
        let store = shared(Config::default().with_sweep_interval(Duration::from_secs(3600)));
        let watcher = Watcher::spawn(store);

        // Stop during the long sleep
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!watcher.is_finished());
        assert_ok!(watcher.stop().await);
    }

    #[tokio::test]
    async fn test_watcher_stops_when_dropped() {
        let store = shared(Config::default().with_sweep_interval(Duration::from_millis(5)));
        let watcher = Watcher::spawn(store.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(watcher);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sweeps = store.read().await.stats().sweeps;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.read().await.stats().sweeps, sweeps);
    }

    #[tokio::test]
    async fn test_panicking_hook_surfaces_on_stop() {
        let config = Config::default()
            .with_max_entries(1)
            .with_sweep_interval(Duration::from_millis(5));
        let store = shared(config);
        {
            let mut guard = store.write().await;
            guard.set_post_delete(|_: &String, _: &String, _| panic!("hook failed"));
            guard.insert("a".to_string(), "1".to_string());
            guard.insert_if_absent("b".to_string(), "2".to_string());
        }

        let watcher = Watcher::spawn(store.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(watcher.is_finished());
        assert_err!(watcher.stop().await);
    }
}
