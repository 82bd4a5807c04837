// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The linear probe with Robin Hood displacement.
//!
//! [`find`], [`insert`] and [`rehash_insert`] are the three modes of one
//! underlying sweep (search / insert / rehash-replay in the original design).
//! They are split into separate functions here, rather than a single
//! argument-shape-dispatched routine, because the three modes differ in
//! which values they own outright (a borrowed key for a lookup vs. an owned
//! `(K, V)` candidate for an insert) in a way C's untyped `void *`
//! parameters could paper over but Rust's ownership cannot. All three walk
//! the same `p = hash, hash+1, ...` sequence and apply the same
//! candidate-vs-occupant displacement rule.

use std::borrow::Borrow;

use crate::bucket::Bucket;
use crate::storage::RawStorage;
use crate::table::Counters;

/// Outcome of looking an occupied-or-not key up.
pub(crate) enum FindResult {
    Found(usize),
    Absent,
}

/// Searches for `key`'s slot without mutating anything.
///
/// `hash32` is the caller's full hash of `key`; only its low 24 bits are
/// ever compared against what's stored, but the full value seeds the
/// initial probe position.
pub(crate) fn find<K, V, Q>(storage: &RawStorage<K, V>, mask: u32, hash32: u32, key: &Q) -> FindResult
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    let mut candidate = Bucket::occupied(Bucket::truncate_hash(hash32), 0);
    let mut p = hash32;

    loop {
        let idx = (p & mask) as usize;
        let occupant = storage.bucket(idx);

        if occupant.is_empty() {
            return FindResult::Absent;
        }

        if candidate.same_word(occupant) && storage.entry_ref(idx).0.borrow() == key {
            return FindResult::Found(idx);
        }

        if candidate.psl() > occupant.psl() {
            // Robin Hood ordering: if the key were present, it would have
            // displaced its way to here or earlier.
            return FindResult::Absent;
        }

        candidate = candidate.incremented_psl();
        p = p.wrapping_add(1);
    }
}

/// Outcome of an insert attempt.
pub(crate) enum InsertResult<K, V> {
    /// The key was not present; it has been inserted.
    Inserted,
    /// The key was already present, at this index. The candidate entry is
    /// handed back unused.
    Found(usize, K, V),
    /// The table is full at its current size. Nothing was changed; the
    /// candidate entry is handed back so the caller can retry after
    /// growing.
    NeedsGrow(K, V),
}

/// Finds or inserts `key`/`value`, displacing occupants with a smaller PSL
/// along the way (Robin Hood hashing).
///
/// `threshold` is the table's current expansion threshold (`tsize * lft /
/// 100`); once `count` reaches it, a fresh insert into an empty slot (or a
/// first displacement) is refused with [`InsertResult::NeedsGrow`] instead
/// of proceeding, so that the table never exceeds it by more than the one
/// in-flight insert that triggered the resize.
pub(crate) fn insert<K, V>(
    storage: &mut RawStorage<K, V>,
    mask: u32,
    psl_limit: u8,
    threshold: u32,
    counters: &mut Counters,
    hash32: u32,
    key: K,
    value: V,
) -> InsertResult<K, V>
where
    K: Eq,
{
    let mut cand_bucket = Bucket::occupied(Bucket::truncate_hash(hash32), 0);
    let mut cand_key = key;
    let mut cand_value = value;
    let mut known_unique = false;
    let mut p = hash32;

    loop {
        let idx = (p & mask) as usize;
        let occupant = storage.bucket(idx);

        if occupant.is_empty() {
            if counters.count == threshold {
                return InsertResult::NeedsGrow(cand_key, cand_value);
            }
            storage.set_bucket(idx, cand_bucket);
            // SAFETY: slot was empty, nothing to drop.
            unsafe { storage.write_entry(idx, (cand_key, cand_value)) };
            counters.record_insert(cand_bucket, psl_limit);
            return InsertResult::Inserted;
        }

        if !known_unique && cand_bucket.same_word(occupant) && storage.entry_ref(idx).0 == cand_key
        {
            return InsertResult::Found(idx, cand_key, cand_value);
        }

        if cand_bucket.psl() > occupant.psl() {
            if !known_unique && counters.count == threshold {
                return InsertResult::NeedsGrow(cand_key, cand_value);
            }
            // SAFETY: slot is occupied; we read its value out and overwrite
            // the slot with the candidate in the same breath, so nothing is
            // ever read twice or dropped without being read.
            let (old_key, old_value) = unsafe { storage.read_entry(idx) };
            storage.set_bucket(idx, cand_bucket);
            unsafe { storage.write_entry(idx, (cand_key, cand_value)) };
            counters.record_displace(occupant, cand_bucket, psl_limit);

            cand_bucket = occupant;
            cand_key = old_key;
            cand_value = old_value;
            known_unique = true;
        }

        debug_assert!(
            cand_bucket.psl() < psl_limit,
            "psl hard limit circuit breaker failed to stop this insert"
        );
        cand_bucket = cand_bucket.incremented_psl();
        p = p.wrapping_add(1);
    }
}

/// Replays a single entry into freshly (re)allocated storage during a
/// resize. The key is already known not to collide with anything placed so
/// far (every entry replayed this way came out of the old, internally
/// consistent table), so no equality comparisons are made and this can
/// never report "needs grow" — the destination was sized to fit every
/// entry being replayed.
pub(crate) fn rehash_insert<K, V>(
    storage: &mut RawStorage<K, V>,
    mask: u32,
    psl_limit: u8,
    counters: &mut Counters,
    hash24: u32,
    key: K,
    value: V,
) {
    let mut cand_bucket = Bucket::occupied(hash24, 0);
    let mut cand_key = key;
    let mut cand_value = value;
    let mut p = hash24;

    loop {
        let idx = (p & mask) as usize;
        let occupant = storage.bucket(idx);

        if occupant.is_empty() {
            storage.set_bucket(idx, cand_bucket);
            // SAFETY: slot was empty.
            unsafe { storage.write_entry(idx, (cand_key, cand_value)) };
            counters.record_insert(cand_bucket, psl_limit);
            return;
        }

        if cand_bucket.psl() > occupant.psl() {
            // SAFETY: slot occupied; read-then-overwrite as above.
            let (old_key, old_value) = unsafe { storage.read_entry(idx) };
            storage.set_bucket(idx, cand_bucket);
            unsafe { storage.write_entry(idx, (cand_key, cand_value)) };
            counters.record_displace(occupant, cand_bucket, psl_limit);

            cand_bucket = occupant;
            cand_key = old_key;
            cand_value = old_value;
        }

        debug_assert!(cand_bucket.psl() < psl_limit, "rehash produced an over-limit PSL");
        cand_bucket = cand_bucket.incremented_psl();
        p = p.wrapping_add(1);
    }
}
