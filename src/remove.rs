// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Backward-shift deletion: removes an entry without leaving a tombstone,
//! by pulling each subsequent run of displaced entries one slot closer to
//! its ideal bucket until a natural stopping point (an empty slot, or an
//! entry already at its ideal bucket) is reached.

use crate::bucket::Bucket;
use crate::storage::RawStorage;
use crate::table::Counters;

/// Removes the entry at `idx` (which must be occupied) and closes the gap
/// by shifting the following run of entries backward, wrapping at the end
/// of the table. Returns the removed entry.
pub(crate) fn remove_at<K, V>(
    storage: &mut RawStorage<K, V>,
    mask: u32,
    psl_limit: u8,
    counters: &mut Counters,
    idx: usize,
) -> (K, V) {
    let removed_bucket = storage.bucket(idx);
    debug_assert!(!removed_bucket.is_empty());

    // SAFETY: `idx` is occupied (caller located it via `probe::find`), and
    // its bucket is about to be overwritten or cleared below, so nothing
    // reads this slot again before it is reinitialized.
    let removed = unsafe { storage.read_entry(idx) };
    counters.record_remove(removed_bucket, psl_limit);

    let mut hole = idx;
    loop {
        let next = ((hole as u32 + 1) & mask) as usize;
        let next_bucket = storage.bucket(next);

        // An empty slot, or one already at its ideal bucket (PSL 0), is as
        // far as displaced entries reach; the hole closes here.
        if next_bucket.is_empty() || next_bucket.psl() == 0 {
            storage.set_bucket(hole, Bucket::EMPTY);
            return removed;
        }

        // SAFETY: `next` and `hole` are both valid indices into storage of
        // the same table; moving a single slot backward by one never
        // crosses itself since `next != hole`.
        unsafe { storage.move_range(next, hole, 1) };
        storage.set_bucket(hole, next_bucket.decrement_psl());
        counters.record_shift(next_bucket, psl_limit);

        hole = next;
    }
}
