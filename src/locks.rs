//! Named advisory locks serializing mutations of the same resource.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Held while a mutation is in flight; dropping it releases the lock.
///
/// The last holder of a key also removes it from the table, so the table
/// only holds keys that are locked or awaited.
#[derive(Debug)]
pub struct LockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    table: LockTable,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // the guard owns a reference to the mutex, release it before counting
        drop(self.guard.take());
        let mut locks = lock_table(&self.table);
        let idle = locks
            .get(&self.key)
            .map_or(false, |lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.key);
        }
    }
}

fn lock_table(table: &LockTable) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
    // a poisoned table still holds valid entries
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A set of locks keyed by name.
///
/// Cloning shares the underlying table.
#[derive(Debug, Clone, Default)]
pub struct ResourceLocks {
    locks: LockTable,
}

impl ResourceLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `name` within `resource_type`, e.g. a Web PubSub service by name.
    pub async fn by_name(&self, name: &str, resource_type: &str) -> LockGuard {
        self.acquire(format!("{}.{}", resource_type, name)).await
    }

    /// Lock a resource by its ID.
    pub async fn by_id(&self, id: &str) -> LockGuard {
        self.acquire(id.to_string()).await
    }

    async fn acquire(&self, key: String) -> LockGuard {
        let lock = Arc::clone(lock_table(&self.locks).entry(key.clone()).or_default());
        debug!(key = %key, "acquiring lock");
        let guard = lock.lock_owned().await;
        LockGuard {
            guard: Some(guard),
            key,
            table: Arc::clone(&self.locks),
        }
    }

    /// Number of keys currently locked or awaited.
    pub fn len(&self) -> usize {
        lock_table(&self.locks).len()
    }

    /// Whether no key is locked or awaited.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_name_is_exclusive() {
        let locks = ResourceLocks::new();
        let guard = locks.by_name("wps", "azurerm_web_pubsub").await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.by_name("wps", "azurerm_web_pubsub").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_names_do_not_block() {
        let locks = ResourceLocks::new();
        let _a = locks.by_name("a", "azurerm_web_pubsub").await;
        let _b = tokio::time::timeout(Duration::from_secs(1), locks.by_name("b", "azurerm_web_pubsub"))
            .await
            .unwrap();
        let _c = tokio::time::timeout(Duration::from_secs(1), locks.by_id("a"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_released_keys_leave_the_table() {
        let locks = ResourceLocks::new();
        let guard = locks.by_id("/subscriptions/s/resourceGroups/rg").await;
        assert_eq!(locks.len(), 1);

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = other.by_id("/subscriptions/s/resourceGroups/rg").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the waiter still needs the entry once the first holder lets go
        drop(guard);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }
}
