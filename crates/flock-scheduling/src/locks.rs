//! Keyed async locks serialising scheduling decisions.
//!
//! A scheduling request locks the volunteer's day and the opportunity's
//! day before it reads anything, so two requests that could invalidate
//! each other's checks never interleave. Keys are always taken in sorted
//! order, which rules out lock-order deadlocks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum LockKey {
    Volunteer(Uuid, NaiveDate),
    Opportunity(Uuid, NaiveDate),
}

#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    slots: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

/// Guards released together when dropped.
pub(crate) struct LockSet {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl KeyedLocks {
    pub(crate) async fn acquire(&self, mut keys: Vec<LockKey>) -> LockSet {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.slot(key).lock_owned().await);
        }
        LockSet { _guards: guards }
    }

    fn slot(&self, key: LockKey) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map holds an idle slot; anyone waiting or locked holds a clone.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots.entry(key).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::default());
        let key = LockKey::Opportunity(Uuid::new_v4(), day());

        let held = locks.acquire(vec![key]).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _set = locks.acquire(vec![key]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let locks = KeyedLocks::default();
        let _a = locks
            .acquire(vec![LockKey::Volunteer(Uuid::new_v4(), day())])
            .await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(vec![LockKey::Volunteer(Uuid::new_v4(), day())]),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = KeyedLocks::default();
        for _ in 0..5 {
            let _set = locks
                .acquire(vec![LockKey::Volunteer(Uuid::new_v4(), day())])
                .await;
        }
        let _last = locks
            .acquire(vec![LockKey::Opportunity(Uuid::new_v4(), day())])
            .await;
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn volunteer_keys_sort_before_opportunity_keys() {
        let id = Uuid::new_v4();
        assert!(LockKey::Volunteer(id, day()) < LockKey::Opportunity(id, day()));
    }
}
