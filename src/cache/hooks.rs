//! Deletion hooks fired by the single removal path.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Callback invoked with the key, value and set time of a removed entry.
///
/// Hooks run synchronously while the cache's write lock is held. They must be
/// fast and must not call back into the same cache: the lock is not
/// re-entrant. A hook that panics unwinds through the caller of the
/// operation that triggered the removal.
pub type DeleteHook<K, V> = Arc<dyn Fn(&K, &V, DateTime<Utc>) + Send + Sync>;

/// Optional hooks around each removal.
pub struct Hooks<K, V> {
    /// Runs while the entry is still in the store
    pub pre_delete: Option<DeleteHook<K, V>>,
    /// Runs after the entry has left the store
    pub post_delete: Option<DeleteHook<K, V>>,
}

impl<K, V> Default for Hooks<K, V> {
    fn default() -> Self {
        Self {
            pre_delete: None,
            post_delete: None,
        }
    }
}

impl<K, V> Clone for Hooks<K, V> {
    fn clone(&self) -> Self {
        Self {
            pre_delete: self.pre_delete.clone(),
            post_delete: self.post_delete.clone(),
        }
    }
}

impl<K, V> fmt::Debug for Hooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_delete", &self.pre_delete.is_some())
            .field("post_delete", &self.post_delete.is_some())
            .finish()
    }
}
