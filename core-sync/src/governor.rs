//! # Write Governor
//!
//! Bounds concurrent store write transactions and serializes content
//! reconciliation per playlist.
//!
//! A task must never hold a write permit while waiting for a playlist lock
//! or for a second permit.

use crate::error::{Result, SyncError};
use core_async::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

pub struct WriteGovernor {
    permits: Arc<Semaphore>,
    capacity: usize,
    playlist_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WriteGovernor {
    pub fn new(max_concurrent_writes: usize) -> Self {
        let capacity = max_concurrent_writes.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            playlist_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a write slot; released when the permit is dropped.
    pub async fn acquire_write(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SyncError::TaskFailed("write semaphore closed".to_string()))
    }

    /// Exclusive access to one playlist's contents.
    pub async fn lock_playlist(&self, playlist_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.playlist_locks.lock().await;
            // Entries nobody holds or waits on can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                locks
                    .entry(playlist_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        trace!(playlist_id, "Waiting for playlist lock");
        lock.lock_owned().await
    }
}

impl Default for WriteGovernor {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_async::time::{timeout, Duration};

    #[core_async::test]
    async fn test_write_permits_are_bounded() {
        let governor = WriteGovernor::new(2);
        let first = governor.acquire_write().await.unwrap();
        let _second = governor.acquire_write().await.unwrap();
        assert_eq!(governor.available_permits(), 0);

        assert!(timeout(Duration::from_millis(20), governor.acquire_write())
            .await
            .is_err());

        drop(first);
        assert!(governor.acquire_write().await.is_ok());
    }

    #[core_async::test]
    async fn test_same_playlist_is_serialized() {
        let governor = WriteGovernor::default();
        let held = governor.lock_playlist("p1").await;

        assert!(timeout(Duration::from_millis(20), governor.lock_playlist("p1"))
            .await
            .is_err());
        // Other playlists are unaffected.
        let _other = governor.lock_playlist("p2").await;

        drop(held);
        let _again = governor.lock_playlist("p1").await;
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(WriteGovernor::new(0).capacity(), 1);
    }
}
