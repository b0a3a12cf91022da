//! Lock-sharded map used to accumulate per-document relevance from many threads.
//!
//! Keys are integers; a key always lives in shard `key mod shard_count`, so
//! updates to one key serialize on one mutex while other shards stay free.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Integer keys that can select a shard.
pub trait ShardKey: Copy + Ord {
    fn shard_hash(self) -> u64;
}

macro_rules! impl_shard_key {
    ($($t:ty),*) => {
        $(impl ShardKey for $t {
            #[inline]
            fn shard_hash(self) -> u64 { self as u64 }
        })*
    };
}

impl_shard_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

pub struct ConcurrentMap<K, V> {
    shards: Vec<Mutex<BTreeMap<K, V>>>,
}

/// Exclusive handle to one value. The shard stays locked until the handle is dropped.
pub struct Access<'a, V> {
    guard: MappedMutexGuard<'a, V>,
}

impl<V> Deref for Access<'_, V> {
    type Target = V;
    fn deref(&self) -> &V { &self.guard }
}

impl<V> DerefMut for Access<'_, V> {
    fn deref_mut(&mut self) -> &mut V { &mut self.guard }
}

impl<K: ShardKey, V> ConcurrentMap<K, V> {
    /// Creates a map with `shard_count` partitions (at least one).
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize { self.shards.len() }

    fn shard(&self, key: K) -> &Mutex<BTreeMap<K, V>> {
        let idx = key.shard_hash() % self.shards.len() as u64;
        &self.shards[idx as usize]
    }

    /// Locks the key's shard and returns its slot, inserting `V::default()` if absent.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        let guard = MutexGuard::map(self.shard(key).lock(), |map| map.entry(key).or_default());
        Access { guard }
    }

    pub fn erase(&self, key: K) -> Option<V> {
        self.shard(key).lock().remove(&key)
    }

    /// Merges all shards into one ordered map, locking each shard in turn.
    pub fn to_map(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let mut merged = BTreeMap::new();
        for shard in &self.shards {
            let guard = shard.lock();
            merged.extend(guard.iter().map(|(k, v)| (*k, v.clone())));
        }
        merged
    }

    /// Consumes the map and merges all shards into one ordered map.
    pub fn into_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for shard in self.shards {
            merged.append(&mut shard.into_inner());
        }
        merged
    }
}
