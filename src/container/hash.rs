use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Mutex;

/// A bucket holds up to bucket_size entries whose hashes agree on the
/// low local_depth bits. Entries are kept in insertion order with no
/// duplicate keys.
struct Bucket<K, V> {
    local_depth: usize,
    items: Vec<(K, V)>,
}

struct Directory<K, V> {
    global_depth: usize,
    /// Directory of 2^global_depth slots. Multiple slots may share one
    /// bucket, so slots hold indices into the bucket arena rather than
    /// owning buckets directly.
    slots: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
}

/// An extendible hash table: a dynamic, dictionary-preserving hash
/// structure that grows without rehashing the entire dataset. When a
/// bucket overflows it is split in two, doubling the directory first
/// if the bucket already uses every directory bit. Buckets are never
/// merged or shrunk.
///
/// Note that a run of inserts whose keys all hash to the same value
/// keeps doubling the directory without ever making room, callers are
/// expected to use a reasonable hasher.
///
/// A single mutex serializes all directory and bucket access, readers
/// included. The hasher is pluggable so tests can pin hash values, the
/// default is the std RandomState.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    bucket_size: usize,
    hash_builder: S,
    inner: Mutex<Directory<K, V>>,
}

impl<K, V> ExtendibleHashTable<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    pub fn with_hasher(bucket_size: usize, hash_builder: S) -> Self {
        assert!(bucket_size > 0, "bucket size must be larger than zero");
        let inner = Directory {
            global_depth: 0,
            slots: vec![0],
            buckets: vec![Bucket { local_depth: 0, items: Vec::new() }],
        };
        ExtendibleHashTable { bucket_size, hash_builder, inner: Mutex::new(inner) }
    }

    fn hash(&self, key: &K) -> usize {
        self.hash_builder.hash_one(key) as usize
    }

    /// Look up the value stored under key, if any.
    pub fn find(&self, key: &K) -> Option<V> {
        let hash = self.hash(key);
        let inner = self.inner.lock().unwrap();
        let slot = hash & ((1 << inner.global_depth) - 1);
        let bucket = &inner.buckets[inner.slots[slot]];
        bucket.items.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    /// Remove the entry stored under key, return whether an entry
    /// was removed.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let mut inner = self.inner.lock().unwrap();
        let slot = hash & ((1 << inner.global_depth) - 1);
        let bucket_idx = inner.slots[slot];
        let bucket = &mut inner.buckets[bucket_idx];
        let before = bucket.items.len();
        bucket.items.retain(|(k, _)| k != key);
        bucket.items.len() != before
    }

    /// Insert a key/value pair, overwrite the value if the key already
    /// exists. An insert into a full bucket splits the bucket, doubling
    /// the directory first when the bucket's local depth has caught up
    /// with the global depth, and then retries.
    pub fn insert(&self, key: K, value: V) {
        let hash = self.hash(&key);
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        loop {
            let slot = hash & ((1 << inner.global_depth) - 1);
            let bucket_idx = inner.slots[slot];
            let bucket = &mut inner.buckets[bucket_idx];
            if let Some(entry) = bucket.items.iter_mut().find(|(k, _)| k == &key) {
                entry.1 = value;
                return;
            }
            if bucket.items.len() < self.bucket_size {
                bucket.items.push((key, value));
                return;
            }

            // the target bucket is full. grow the directory if the bucket
            // already distinguishes on every directory bit, then split it
            // and try again.
            if bucket.local_depth == inner.global_depth {
                let len = inner.slots.len();
                inner.slots.extend_from_within(0..len);
                inner.global_depth += 1;
            }
            self.split(inner, hash);
        }
    }

    /// Split the bucket the hash currently maps to. The sibling takes
    /// over the entries whose next hash bit is set, along with every
    /// directory slot matching the sibling's bit pattern.
    fn split(&self, inner: &mut Directory<K, V>, hash: usize) {
        let slot = hash & ((1 << inner.global_depth) - 1);
        let old_idx = inner.slots[slot];
        let new_depth = inner.buckets[old_idx].local_depth + 1;
        let new_mask = (1 << new_depth) - 1;
        // every key in the old bucket agrees on the low new_depth-1 bits,
        // the sibling pattern sets the new distinguishing bit on top.
        let new_pattern = (slot & (new_mask >> 1)) | (1 << (new_depth - 1));

        inner.buckets[old_idx].local_depth = new_depth;
        let items = std::mem::take(&mut inner.buckets[old_idx].items);
        let (moved, kept): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|(k, _)| self.hash(k) & new_mask == new_pattern);
        inner.buckets[old_idx].items = kept;

        let new_idx = inner.buckets.len();
        inner.buckets.push(Bucket { local_depth: new_depth, items: moved });
        for i in 0..inner.slots.len() {
            if i & new_mask == new_pattern {
                inner.slots[i] = new_idx;
            }
        }
    }

    /// log2 of the directory size.
    pub fn global_depth(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.global_depth
    }

    /// Number of low-order hash bits that select the bucket behind the
    /// given directory slot.
    pub fn local_depth(&self, dir_index: usize) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.buckets[inner.slots[dir_index]].local_depth
    }

    pub fn num_buckets(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.buckets.len()
    }
}
