use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slots = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per account name.
///
/// Locks are always taken in lexicographic name order, so two operations
/// over the same pair of accounts cannot deadlock regardless of direction.
/// A slot lives only while some task holds or waits on it.
#[derive(Default, Clone)]
pub struct AccountLocks {
    slots: Arc<Slots>,
}

struct SlotGuard {
    name: String,
    slots: Arc<Slots>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Release first so the guard's own reference is gone before the count check.
        self.guard.take();
        self.slots
            .remove_if(&self.name, |_, slot| Arc::strong_count(slot) == 1);
    }
}

/// Held locks; released on drop.
#[must_use = "locks are released as soon as the guards are dropped"]
pub struct AccountGuards {
    _guards: Vec<SlotGuard>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to every named account.
    pub async fn acquire(&self, names: &[&str]) -> AccountGuards {
        let mut ordered = names.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for name in ordered {
            let slot = self.slots.entry(name.to_string()).or_default().clone();
            // Declared before the wait so a cancelled waiter still removes the slot.
            let mut held = SlotGuard {
                name: name.to_string(),
                slots: self.slots.clone(),
                guard: None,
            };
            held.guard = Some(slot.lock_owned().await);
            guards.push(held);
        }
        AccountGuards { _guards: guards }
    }

    /// Number of names currently held or awaited.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
