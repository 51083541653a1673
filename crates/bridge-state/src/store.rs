//! Layered key-value storage with snapshot support.
//!
//! [`MemStore`] is the underlying multi-store: one ordered map per module.
//! [`CacheStore`] is the scratch overlay a transaction executes against; it
//! can be snapshotted, restored, and flushed into the underlying store
//! exactly once at transaction commit.

use std::collections::BTreeMap;

type Kv = BTreeMap<Vec<u8>, Vec<u8>>;

/// The underlying multi-store keyed by module name.
///
/// Uses `BTreeMap` throughout so iteration order is deterministic. Counts
/// flushes so the at-most-once-commit invariant is observable in tests.
#[derive(Debug, Default)]
pub struct MemStore {
    modules: BTreeMap<String, Kv>,
    write_count: u64,
}

impl MemStore {
    pub fn get(&self, module: &str, key: &[u8]) -> Option<&[u8]> {
        self.modules
            .get(module)
            .and_then(|kv| kv.get(key))
            .map(Vec::as_slice)
    }

    /// How many times a cache overlay has been flushed into this store.
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

/// Opaque marker for a [`CacheStore`]'s state at a point in time.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    writes: BTreeMap<String, BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

/// Scratch overlay over a [`MemStore`].
///
/// Writes are buffered as `Some(value)` / `None` (deletion) and only reach
/// the underlying store on [`CacheStore::write`].
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    writes: BTreeMap<String, BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl CacheStore {
    pub fn get<'a>(&'a self, base: &'a MemStore, module: &str, key: &[u8]) -> Option<&'a [u8]> {
        if let Some(pending) = self.writes.get(module).and_then(|kv| kv.get(key)) {
            return pending.as_deref();
        }
        base.get(module, key)
    }

    pub fn set(&mut self, module: &str, key: Vec<u8>, value: Vec<u8>) {
        self.writes
            .entry(module.to_owned())
            .or_default()
            .insert(key, Some(value));
    }

    pub fn delete(&mut self, module: &str, key: &[u8]) {
        self.writes
            .entry(module.to_owned())
            .or_default()
            .insert(key.to_vec(), None);
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            writes: self.writes.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.writes = snapshot.writes;
    }

    /// Flushes every buffered write into the underlying store and clears the
    /// overlay. A transaction performs this at most once.
    pub fn write(&mut self, base: &mut MemStore) {
        for (module, kv) in std::mem::take(&mut self.writes) {
            let target = base.modules.entry(module).or_default();
            for (key, value) in kv {
                match value {
                    Some(value) => {
                        target.insert(key, value);
                    }
                    None => {
                        target.remove(&key);
                    }
                }
            }
        }
        base.write_count += 1;
    }
}
