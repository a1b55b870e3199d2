//! Bucketed hash table used for glyph tables and the face map
//!
//! Each bucket is a small vector kept sorted by the key's total order, so a
//! collision scan is a binary search and iteration inside a bucket is
//! deterministic. The bucket count is a power of two and doubles whenever
//! the load factor would pass 3/4.
//!
//! All allocation goes through fallible reservation. An insertion that
//! cannot get memory fails before touching any entry, which is what lets the
//! cache promise "no partial insertion" on `OutOfMemory`.

use std::cmp::Ordering;

use crate::error::{GlyphCacheError, Result};

/// Hashing and ordering capabilities required from table keys
///
/// Equal keys (`table_cmp == Equal`) must produce equal hashes.
pub trait TableKey {
    fn table_hash(&self) -> u64;
    fn table_cmp(&self, other: &Self) -> Ordering;
}

impl TableKey for u32 {
    fn table_hash(&self) -> u64 {
        // Fibonacci hashing spreads consecutive code points across buckets
        (*self as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    fn table_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Smallest bucket array allocated on first insertion
pub const MIN_BUCKETS: usize = 8;

pub struct BucketTable<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    initial_buckets: usize,
}

impl<K: TableKey, V> BucketTable<K, V> {
    /// An empty table; no memory is allocated until the first insertion
    pub fn new() -> Self {
        Self::with_initial_buckets(MIN_BUCKETS)
    }

    /// Like [`new`](Self::new) but with a larger first allocation
    pub fn with_initial_buckets(initial: usize) -> Self {
        Self {
            buckets: Vec::new(),
            len: 0,
            initial_buckets: initial.max(MIN_BUCKETS).next_power_of_two(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(hash: u64, bucket_count: usize) -> usize {
        let folded = hash ^ (hash >> 29) ^ (hash >> 47);
        (folded as usize) & (bucket_count - 1)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_with(key.table_hash(), |probe| probe.table_cmp(key))
    }

    /// Lookup by precomputed hash and a comparison closure
    ///
    /// The closure compares a stored key against the probe; it lets callers
    /// search with borrowed forms of the key without building an owned one.
    pub fn get_with(&self, hash: u64, cmp: impl Fn(&K) -> Ordering) -> Option<&V> {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = &self.buckets[Self::bucket_index(hash, self.buckets.len())];
        bucket
            .binary_search_by(|(stored, _)| cmp(stored))
            .ok()
            .map(|pos| &bucket[pos].1)
    }

    #[cfg(test)]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if self.buckets.is_empty() {
            return None;
        }
        let idx = Self::bucket_index(key.table_hash(), self.buckets.len());
        let bucket = &mut self.buckets[idx];
        match bucket.binary_search_by(|(stored, _)| stored.table_cmp(key)) {
            Ok(pos) => Some(&mut bucket[pos].1),
            Err(_) => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Makes room so that inserting `key` cannot allocate
    ///
    /// Grows the bucket array first if one more entry would pass the load
    /// factor, then reserves a slot in the bucket `key` lands in. On error
    /// the table is unchanged.
    pub fn try_reserve_for(&mut self, key: &K) -> Result<()> {
        if self.buckets.is_empty() {
            self.rehash(self.initial_buckets)?;
        } else if (self.len + 1) * 4 > self.buckets.len() * 3 {
            self.rehash(self.buckets.len() * 2)?;
        }
        let idx = Self::bucket_index(key.table_hash(), self.buckets.len());
        self.buckets[idx]
            .try_reserve(1)
            .map_err(|_| GlyphCacheError::OutOfMemory("hash table bucket"))
    }

    /// Inserts, replacing and returning any previous value for an equal key
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.try_reserve_for(&key)?;
        Ok(self.insert_reserved(key, value))
    }

    /// Insert after a successful [`try_reserve_for`](Self::try_reserve_for)
    /// with an equal key
    pub fn insert_reserved(&mut self, key: K, value: V) -> Option<V> {
        debug_assert!(!self.buckets.is_empty(), "insert_reserved without reservation");
        let idx = Self::bucket_index(key.table_hash(), self.buckets.len());
        let bucket = &mut self.buckets[idx];
        match bucket.binary_search_by(|(stored, _)| stored.table_cmp(&key)) {
            Ok(pos) => Some(std::mem::replace(&mut bucket[pos].1, value)),
            Err(pos) => {
                bucket.insert(pos, (key, value));
                self.len += 1;
                None
            },
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_with(key.table_hash(), |probe| probe.table_cmp(key))
    }

    pub fn remove_with(&mut self, hash: u64, cmp: impl Fn(&K) -> Ordering) -> Option<V> {
        if self.buckets.is_empty() {
            return None;
        }
        let idx = Self::bucket_index(hash, self.buckets.len());
        let bucket = &mut self.buckets[idx];
        let pos = bucket.binary_search_by(|(stored, _)| cmp(stored)).ok()?;
        self.len -= 1;
        Some(bucket.remove(pos).1)
    }

    /// Entries in bucket order (not sorted across buckets)
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(k, v)| (k, v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Entries ordered by the key's total order
    #[cfg(test)]
    pub fn sorted(&self) -> Vec<(&K, &V)> {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.table_cmp(b.0));
        entries
    }

    /// Removes every entry, keeping the bucket array
    #[cfg(test)]
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Moves every entry into a bucket array of `new_count` buckets
    ///
    /// All memory is reserved before the first entry moves, so failure
    /// leaves the current array intact.
    fn rehash(&mut self, new_count: usize) -> Result<()> {
        let new_count = new_count.max(MIN_BUCKETS).next_power_of_two();

        let mut counts: Vec<usize> = Vec::new();
        counts
            .try_reserve_exact(new_count)
            .map_err(|_| GlyphCacheError::OutOfMemory("hash table buckets"))?;
        counts.resize(new_count, 0);
        for (key, _) in self.iter() {
            counts[Self::bucket_index(key.table_hash(), new_count)] += 1;
        }

        let mut fresh: Vec<Vec<(K, V)>> = Vec::new();
        fresh
            .try_reserve_exact(new_count)
            .map_err(|_| GlyphCacheError::OutOfMemory("hash table buckets"))?;
        for count in counts {
            let mut bucket = Vec::new();
            bucket
                .try_reserve_exact(count)
                .map_err(|_| GlyphCacheError::OutOfMemory("hash table bucket"))?;
            fresh.push(bucket);
        }

        // Each new bucket is fed from a single old bucket (power-of-two
        // split), so pushing in old order keeps it sorted.
        for bucket in std::mem::take(&mut self.buckets) {
            for (key, value) in bucket {
                let idx = Self::bucket_index(key.table_hash(), new_count);
                fresh[idx].push((key, value));
            }
        }
        log::trace!(
            "Rehashed table of {} entries into {} buckets",
            self.len,
            new_count
        );
        self.buckets = fresh;
        Ok(())
    }
}

impl<K: TableKey, V> Default for BucketTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
