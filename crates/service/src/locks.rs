use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes read-modify-write cycles on a candidate, keyed by email.
///
/// Slots nobody holds or waits on are pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct EmailLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl EmailLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the caller exclusively owns `email`.
    pub async fn acquire(&self, email: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(email.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_email_is_exclusive() {
        let locks = Arc::new(EmailLocks::new());
        let guard = locks.acquire("a@x.com").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("a@x.com").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.expect("contender completes");
    }

    #[tokio::test]
    async fn different_emails_do_not_block() {
        let locks = EmailLocks::new();
        let _first = locks.acquire("a@x.com").await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b@x.com"))
            .await
            .expect("other email is free");
        drop(second);
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = EmailLocks::new();
        drop(locks.acquire("a@x.com").await);
        drop(locks.acquire("b@x.com").await);
        let _held = locks.acquire("c@x.com").await;
        assert_eq!(locks.tracked(), 1);
    }
}
