//! # Per-key vote serialization
//!
//! The ledger reads a vote and then writes it. Two casts for the same
//! (user, target) running at once could both read "no vote" and both report
//! a +1. Holding the key's lock across the cast makes those pairs run one
//! after the other; different keys never wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use rf_core::models::VoteKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct VoteLocks {
    inner: DashMap<VoteKey, Arc<Mutex<()>>>,
}

impl VoteLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. Released when the guard drops.
    ///
    /// The guard exists before the wait starts, so a caller dropped while
    /// still queued prunes the entry on the way out too.
    pub async fn lock(&self, key: VoteKey) -> VoteGuard<'_> {
        let mut held = VoteGuard {
            locks: self,
            key,
            guard: None,
        };
        let mutex = self.inner.entry(key).or_default().clone();
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Keys currently tracked. Idle keys are pruned as guards drop.
    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

pub struct VoteGuard<'a> {
    locks: &'a VoteLocks,
    key: VoteKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for VoteGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left means nobody holds or waits on it.
        self.locks
            .inner
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_core::models::TargetType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn key() -> VoteKey {
        VoteKey {
            user_id: Uuid::now_v7(),
            target_type: TargetType::Post,
            target_id: Uuid::now_v7(),
        }
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(VoteLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let shared = key();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                tokio::spawn(async move {
                    let _guard = locks.lock(shared).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = VoteLocks::new();
        let _first = locks.lock(key()).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock(key())).await;
        assert!(second.is_ok());
        assert_eq!(locks.tracked(), 2);
        drop(second);
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn abandoned_waiter_does_not_leak_its_entry() {
        let locks = VoteLocks::new();
        let shared = key();

        let holder = locks.lock(shared).await;
        let mut waiter = Box::pin(locks.lock(shared));
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut waiter).await.is_err());

        // Released while the waiter is still queued, then the waiter gives up.
        drop(holder);
        assert_eq!(locks.tracked(), 1);
        drop(waiter);
        assert_eq!(locks.tracked(), 0);
    }
}
