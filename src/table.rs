// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The public `RobinTable` facade: lifecycle, resizing, and the
//! single-entry operations built on top of [`crate::probe`] and
//! [`crate::remove`].

use std::borrow::Borrow;
use std::cell::Cell;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

use crate::bucket::{Bucket, MAX_PSL};
use crate::error::Error;
use crate::iter::{Iter, IterMut};
use crate::probe::{self, FindResult, InsertResult};
use crate::remove;
use crate::storage::{RawStorage, MAX_TSIZE};

/// Smallest table ever allocated (also the size used if a requested
/// capacity rounds down to zero entries of headroom).
const MIN_TSIZE: usize = 8;

/// Running per-table statistics, updated incrementally by the probe and
/// removal routines rather than recomputed on demand.
#[derive(Default, Clone, Copy)]
pub(crate) struct Counters {
    pub count: u32,
    pub psl_sum: u64,
    pub peak_psl: u8,
    /// Number of entries currently sitting at exactly the table's
    /// configured `psl_limit`. While this is nonzero, inserts are refused
    /// with [`Error::BadHash`] before a key is even hashed: any further
    /// insert risks needing a PSL beyond what a 7-bit field (or the
    /// caller's configured limit) can record.
    pub max_psl_ct: u32,
}

impl Counters {
    /// Records a new entry landing in a previously empty slot.
    pub fn record_insert(&mut self, bucket: Bucket, psl_limit: u8) {
        self.count += 1;
        let psl = bucket.psl();
        self.psl_sum += psl as u64;
        if psl > self.peak_psl {
            self.peak_psl = psl;
        }
        if psl == psl_limit {
            self.max_psl_ct += 1;
        }
    }

    /// Records `new` taking over a slot that used to hold `old` (Robin Hood
    /// displacement). The displaced entry is not yet finally placed; it
    /// will generate its own `record_insert` or `record_displace` call once
    /// it lands.
    pub fn record_displace(&mut self, old: Bucket, new: Bucket, psl_limit: u8) {
        let old_psl = old.psl();
        let new_psl = new.psl();
        self.psl_sum = self.psl_sum - old_psl as u64 + new_psl as u64;
        if new_psl > self.peak_psl {
            self.peak_psl = new_psl;
        }
        if new_psl == psl_limit {
            self.max_psl_ct += 1;
        }
        if old_psl == psl_limit {
            self.max_psl_ct -= 1;
        }
    }

    /// Records an entry leaving the table outright (backward-shift
    /// deletion's tail case, where a slot becomes empty rather than
    /// receiving a shifted-back neighbor).
    pub fn record_remove(&mut self, bucket: Bucket, psl_limit: u8) {
        self.count -= 1;
        self.psl_sum -= bucket.psl() as u64;
        if bucket.psl() == psl_limit {
            self.max_psl_ct -= 1;
        }
    }

    /// Records a slot's PSL dropping by one as backward-shift deletion
    /// pulls it a step closer to its ideal bucket.
    pub fn record_shift(&mut self, before: Bucket, psl_limit: u8) {
        self.psl_sum -= 1;
        if before.psl() == psl_limit {
            self.max_psl_ct -= 1;
        }
    }
}

/// A point-in-time snapshot of a table's occupancy and probe-length
/// statistics, as returned by [`RobinTable::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    pub len: usize,
    pub capacity: usize,
    pub load_factor: f64,
    pub peak_psl: u8,
    pub mean_psl: f64,
    pub at_psl_limit: u32,
}

/// An open-addressed hash table using Robin Hood probing with backward-shift
/// deletion.
///
/// Keys and values are stored inline in one allocation (see
/// [`crate::storage::RawStorage`]); there are no tombstones, so lookups
/// never degrade from accumulated deletions the way a tombstone-based table
/// can.
pub struct RobinTable<K, V, S = RandomState> {
    storage: RawStorage<K, V>,
    counters: Counters,
    mask: u32,
    threshold: u32,
    lft: u8,
    psl_limit: u8,
    hash_builder: S,
    /// Runtime iterator lock, mirroring the original C library's defensive
    /// belt-and-suspenders check underneath Rust's own borrow-checker
    /// enforcement of `Iter`/`IterMut` exclusivity. `Cell` lets both a
    /// shared [`Iter`] and an exclusive [`IterMut`] register/release the
    /// lock through a `&RobinTable`, without needing a `&mut` borrow that
    /// would itself already rule out the aliasing this exists to catch.
    lock: Cell<u16>,
}

const LOCK_EXCLUSIVE: u16 = 0xFFFF;
const LOCK_MAX_SHARED: u16 = 0x7FFF;

impl<K, V, S> RobinTable<K, V, S> {
    pub fn len(&self) -> usize {
        self.counters.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.counters.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.storage.tsize()
    }

    pub fn load_factor(&self) -> f64 {
        if self.storage.tsize() == 0 {
            0.0
        } else {
            self.counters.count as f64 / self.storage.tsize() as f64
        }
    }

    /// A snapshot of the table's current occupancy and probe-length
    /// statistics.
    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.len(),
            capacity: self.capacity(),
            load_factor: self.load_factor(),
            peak_psl: self.counters.peak_psl,
            mean_psl: if self.counters.count == 0 {
                0.0
            } else {
                self.counters.psl_sum as f64 / self.counters.count as f64
            },
            at_psl_limit: self.counters.max_psl_ct,
        }
    }

    /// Removes every entry, dropping keys and values, without releasing the
    /// backing allocation.
    pub fn clear(&mut self) {
        for i in 0..self.storage.tsize() {
            if !self.storage.bucket(i).is_empty() {
                // SAFETY: occupied slot, read once and dropped immediately.
                unsafe { drop(self.storage.read_entry(i)) };
                self.storage.set_bucket(i, Bucket::EMPTY);
            }
        }
        self.counters = Counters::default();
    }

    /// Acquires the shared-iteration lock, incrementing the shared count.
    pub(crate) fn lock_shared(&self) -> Result<(), Error> {
        let current = self.lock.get();
        if current == LOCK_EXCLUSIVE {
            return Err(Error::IterLock);
        }
        if current == LOCK_MAX_SHARED {
            return Err(Error::IterCount);
        }
        self.lock.set(current + 1);
        Ok(())
    }

    pub(crate) fn unlock_shared(&self) {
        let current = self.lock.get();
        debug_assert!(current > 0 && current <= LOCK_MAX_SHARED);
        self.lock.set(current - 1);
    }

    /// Acquires the exclusive-iteration lock.
    pub(crate) fn lock_exclusive(&self) -> Result<(), Error> {
        if self.lock.get() != 0 {
            return Err(Error::IterLock);
        }
        self.lock.set(LOCK_EXCLUSIVE);
        Ok(())
    }

    pub(crate) fn unlock_exclusive(&self) {
        debug_assert_eq!(self.lock.get(), LOCK_EXCLUSIVE);
        self.lock.set(0);
    }

    pub(crate) fn storage(&self) -> &RawStorage<K, V> {
        &self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut RawStorage<K, V> {
        &mut self.storage
    }

    pub(crate) fn psl_limit(&self) -> u8 {
        self.psl_limit
    }

    pub(crate) fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub(crate) fn mask(&self) -> u32 {
        self.mask
    }

    /// Returns an iterator over `(&K, &V)` pairs. Any number of shared
    /// iterators may coexist; none may coexist with an [`IterMut`].
    pub fn iter(&self) -> Result<Iter<'_, K, V, S>, Error> {
        Iter::new(self)
    }

    /// Returns an iterator over `(&K, &mut V)` pairs, with the ability to
    /// replace or remove the current entry mid-iteration. Exclusive: no
    /// other iterator of either kind may coexist with it.
    pub fn iter_mut(&mut self) -> Result<IterMut<'_, K, V, S>, Error> {
        IterMut::new(self)
    }
}

impl<K, V> RobinTable<K, V, RandomState> {
    /// Creates an empty table with the default capacity, load factor and
    /// PSL limit, using a randomly seeded [`RandomState`].
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty table with room for at least `capacity` entries
    /// before its first resize.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, V> Default for RobinTable<K, V, RandomState> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RobinTable<K, V, S>
where
    S: BuildHasher,
{
    /// Creates an empty table with the default capacity, using a specific
    /// hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        // A fresh table with no entries never needs an allocation up front;
        // `RawStorage::empty()` means the first insert pays for it.
        RobinTable {
            storage: RawStorage::empty(),
            counters: Counters::default(),
            mask: 0,
            threshold: 0,
            lft: 85,
            psl_limit: MAX_PSL,
            hash_builder,
            lock: Cell::new(0),
        }
    }

    /// Creates an empty table with room for at least `capacity` entries,
    /// using a specific hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        let mut table = Self::with_hasher(hash_builder);
        if capacity > 0 {
            let lft = table.lft;
            table.allocate(round_tsize(capacity, lft))?;
        }
        Ok(table)
    }

    fn hash_of<Q>(&self, key: &Q) -> u32
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish() as u32
    }

    fn allocate(&mut self, tsize: usize) -> Result<(), Error> {
        self.storage = RawStorage::with_capacity(tsize)?;
        self.mask = (tsize - 1) as u32;
        self.threshold = (tsize as u64 * self.lft as u64 / 100) as u32;
        Ok(())
    }

    /// Doubles the table's size and replays every live entry into the new
    /// storage via [`probe::rehash_insert`], which skips key comparisons
    /// since every key is already known unique.
    fn grow(&mut self) -> Result<(), Error>
    where
        K: Hash,
    {
        let old_tsize = self.storage.tsize();
        let new_tsize = if old_tsize == 0 { MIN_TSIZE } else { old_tsize * 2 };
        if new_tsize > MAX_TSIZE {
            return Err(Error::TooBig);
        }

        let mut old_storage = std::mem::replace(&mut self.storage, RawStorage::with_capacity(new_tsize)?);
        self.mask = (new_tsize - 1) as u32;
        self.threshold = (new_tsize as u64 * self.lft as u64 / 100) as u32;

        let mut new_counters = Counters::default();
        for i in 0..old_tsize {
            let bucket = old_storage.bucket(i);
            if bucket.is_empty() {
                continue;
            }
            // SAFETY: occupied slot, read once and never touched again
            // (old_storage is dropped, not reused, right after this loop).
            let (key, value) = unsafe { old_storage.read_entry(i) };
            let hash24 = Bucket::truncate_hash(self.hash_of(&key));
            probe::rehash_insert(
                &mut self.storage,
                self.mask,
                self.psl_limit,
                &mut new_counters,
                hash24,
                key,
                value,
            );
        }
        self.counters = new_counters;

        // Every bucket in `old_storage` has been read out and moved into
        // `self.storage`; mark them empty so `old_storage`'s `Drop` does not
        // double-free/double-drop them.
        for i in 0..old_tsize {
            old_storage.set_bucket(i, Bucket::EMPTY);
        }
        Ok(())
    }

    fn ensure_room(&mut self) -> Result<(), Error>
    where
        K: Hash,
    {
        if self.storage.tsize() == 0 {
            self.allocate(MIN_TSIZE)?;
        } else if self.counters.count == self.threshold {
            self.grow()?;
        }
        Ok(())
    }

    fn check_psl_limit(&self) -> Result<(), Error> {
        if self.counters.max_psl_ct != 0 {
            Err(Error::BadHash)
        } else {
            Ok(())
        }
    }

    /// Inserts `key`/`value` if `key` is not already present. Returns
    /// `Ok(true)` if inserted, `Ok(false)` if `key` was already present (in
    /// which case the table is unchanged and `value` is dropped).
    pub fn add(&mut self, key: K, value: V) -> Result<bool, Error>
    where
        K: Hash + Eq,
    {
        self.check_psl_limit()?;
        self.ensure_room()?;
        let hash32 = self.hash_of(&key);
        match probe::insert(
            &mut self.storage,
            self.mask,
            self.psl_limit,
            self.threshold,
            &mut self.counters,
            hash32,
            key,
            value,
        ) {
            InsertResult::Inserted => Ok(true),
            InsertResult::Found(..) => Ok(false),
            InsertResult::NeedsGrow(key, value) => {
                self.grow()?;
                self.add(key, value)
            }
        }
    }

    /// Inserts `key`/`value`, overwriting any existing value for `key`.
    /// Returns the previous value, if any.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>, Error>
    where
        K: Hash + Eq,
    {
        self.check_psl_limit()?;
        self.ensure_room()?;
        let hash32 = self.hash_of(&key);
        match probe::insert(
            &mut self.storage,
            self.mask,
            self.psl_limit,
            self.threshold,
            &mut self.counters,
            hash32,
            key,
            value,
        ) {
            InsertResult::Inserted => Ok(None),
            InsertResult::Found(idx, _key, value) => {
                let slot = self.storage.entry_mut(idx);
                Ok(Some(std::mem::replace(&mut slot.1, value)))
            }
            InsertResult::NeedsGrow(key, value) => {
                self.grow()?;
                self.set(key, value)
            }
        }
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.storage.tsize() == 0 {
            return None;
        }
        let hash32 = self.hash_of(key);
        match probe::find(&self.storage, self.mask, hash32, key) {
            FindResult::Found(idx) => Some(idx),
            FindResult::Absent => None,
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).map(|idx| &self.storage.entry_ref(idx).1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find_index(key) {
            Some(idx) => Some(&mut self.storage.entry_mut(idx).1),
            None => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Replaces the value for an existing key, returning the old value. If
    /// `key` is absent, the table is left unchanged and `None` is returned.
    pub fn replace(&mut self, key: &K, value: V) -> Option<V>
    where
        K: Hash + Eq,
    {
        match self.find_index(key) {
            Some(idx) => {
                let slot = self.storage.entry_mut(idx);
                Some(std::mem::replace(&mut slot.1, value))
            }
            None => None,
        }
    }

    /// Swaps `value` into the slot for `key`, returning the previous value,
    /// without needing a borrowed `&K` comparison against an owned
    /// replacement key.
    pub fn swap<Q>(&mut self, key: &Q, mut value: V) -> Option<V>
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.find_index(key) {
            Some(idx) => {
                std::mem::swap(&mut self.storage.entry_mut(idx).1, &mut value);
                Some(value)
            }
            None => None,
        }
    }

    /// Removes `key`, dropping its value in place. Returns whether `key` was
    /// present. Unlike [`pop`](RobinTable::pop), the value is never handed
    /// back to the caller; use `pop` if you need it.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.pop(key).is_some()
    }

    /// Removes `key` via backward-shift deletion, returning its value if
    /// present.
    pub fn pop<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Hash + Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.find_index(key)?;
        let (_, value) =
            remove::remove_at(&mut self.storage, self.mask, self.psl_limit, &mut self.counters, idx);
        Some(value)
    }

    /// Constructs from raw parts during a builder's `build()`. Not part of
    /// the public API; `RobinTableBuilder` is the supported entry point for
    /// non-default configuration.
    pub(crate) fn from_builder_parts(
        hash_builder: S,
        lft: u8,
        psl_limit: u8,
        capacity: usize,
    ) -> Result<Self, Error> {
        let mut table = RobinTable {
            storage: RawStorage::empty(),
            counters: Counters::default(),
            mask: 0,
            threshold: 0,
            lft,
            psl_limit,
            hash_builder,
            lock: Cell::new(0),
        };
        if capacity > 0 {
            table.allocate(round_tsize(capacity, lft))?;
        }
        Ok(table)
    }
}

/// Picks a `tsize` (power of two, floored at [`MIN_TSIZE`]) large enough
/// that `capacity` entries fit before the load-factor threshold is reached,
/// i.e. `tsize * lft / 100 >= capacity`.
fn round_tsize(capacity: usize, lft: u8) -> usize {
    if capacity == 0 {
        return MIN_TSIZE;
    }
    let needed = (capacity * 100 + lft as usize - 1) / lft as usize;
    needed.next_power_of_two().max(MIN_TSIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_overwrite() {
        let mut t: RobinTable<u32, &str> = RobinTable::new();
        assert_eq!(t.add(1, "one").unwrap(), true);
        assert_eq!(t.get(&1), Some(&"one"));
        assert_eq!(t.add(1, "uno").unwrap(), false);
        assert_eq!(t.get(&1), Some(&"one"));
        assert_eq!(t.set(1, "uno").unwrap(), Some("one"));
        assert_eq!(t.get(&1), Some(&"uno"));
    }

    #[test]
    fn grows_past_default_capacity() {
        let mut t: RobinTable<u32, u32> = RobinTable::new();
        for i in 0..500u32 {
            t.add(i, i * 2).unwrap();
        }
        assert_eq!(t.len(), 500);
        for i in 0..500u32 {
            assert_eq!(t.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn delete_then_absent() {
        let mut t: RobinTable<u32, u32> = RobinTable::new();
        t.add(1, 10).unwrap();
        t.add(2, 20).unwrap();
        assert_eq!(t.pop(&1), Some(10));
        assert_eq!(t.get(&1), None);
        assert_eq!(t.get(&2), Some(&20));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let mut t: RobinTable<u32, u32> = RobinTable::new();
        for i in 0..50u32 {
            t.add(i, i).unwrap();
        }
        t.clear();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        for i in 0..50u32 {
            assert_eq!(t.get(&i), None);
        }
    }

    #[test]
    fn stats_reflect_population() {
        let mut t: RobinTable<u32, u32> = RobinTable::new();
        for i in 0..10u32 {
            t.add(i, i).unwrap();
        }
        let stats = t.stats();
        assert_eq!(stats.len, 10);
        assert!(stats.capacity >= 10);
        assert!(stats.load_factor > 0.0);
    }
}
