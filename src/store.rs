//! Entry storage.
//!
//! The store is the only shared mutable state of the admission subsystem.
//! Every read-modify-write on an entry goes through [`Store::update`], which
//! must apply the closure atomically with respect to other operations on
//! the same identity.

use dashmap::DashMap;

use crate::rate_limit::Entry;

/// Keyed access to per-identity entries.
///
/// Implementations decide how mutual exclusion is achieved (sharded locks,
/// a single mutex, a remote cache with CAS...). Policy code never touches
/// the storage directly.
pub trait Store: Send + Sync {
    /// Snapshot of an entry, without creating it.
    fn get(&self, identity: &str) -> Option<Entry>;

    /// Run `f` on the identity's entry, inserting `init()` first on a miss.
    /// The lookup, the insert and `f` form one transaction.
    fn update<R>(
        &self,
        identity: &str,
        init: impl FnOnce() -> Entry,
        f: impl FnOnce(&mut Entry) -> R,
    ) -> R;

    /// Visit every entry. The callback must not call back into the store.
    /// Concurrent inserts and removals are allowed; a live entry is
    /// visited at most once.
    fn for_each(&self, f: &mut dyn FnMut(&str, &Entry));

    /// Idempotent; returns whether something was removed.
    fn remove(&self, identity: &str) -> bool;

    /// Remove the entry only if `predicate` still holds under the lock.
    fn remove_if(&self, identity: &str, predicate: impl FnOnce(&Entry) -> bool) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the entry, creating it on a miss. Never fails.
    fn get_or_create(&self, identity: &str, init: impl FnOnce() -> Entry) -> Entry {
        self.update(identity, init, |entry| *entry)
    }
}

/// In-process store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, identity: &str) -> Option<Entry> {
        self.entries.get(identity).map(|entry| *entry.value())
    }

    fn update<R>(
        &self,
        identity: &str,
        init: impl FnOnce() -> Entry,
        f: impl FnOnce(&mut Entry) -> R,
    ) -> R {
        // hot path: existing identity, no key allocation
        if let Some(mut entry) = self.entries.get_mut(identity) {
            return f(entry.value_mut());
        }
        let mut entry = self.entries.entry(identity.to_owned()).or_insert_with(init);
        f(entry.value_mut())
    }

    fn for_each(&self, f: &mut dyn FnMut(&str, &Entry)) {
        for item in self.entries.iter() {
            f(item.key(), item.value());
        }
    }

    fn remove(&self, identity: &str) -> bool {
        self.entries.remove(identity).is_some()
    }

    fn remove_if(&self, identity: &str, predicate: impl FnOnce(&Entry) -> bool) -> bool {
        self.entries
            .remove_if(identity, |_, entry| predicate(entry))
            .is_some()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
