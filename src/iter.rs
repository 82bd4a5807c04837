// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Iteration over a table's entries, and the runtime lock that guards it.
//!
//! `Iter` and `IterMut` walk the bucket array slot by slot rather than
//! following any probe order; a table has no "next" pointer between
//! entries, so a full scan is the only way to visit everything.

use crate::error::Error;
use crate::table::RobinTable;

/// A shared iterator over `(&K, &V)` pairs.
///
/// Any number of `Iter`s may coexist over the same table (up to the
/// implementation's iterator-count ceiling), but none may coexist with an
/// [`IterMut`].
pub struct Iter<'a, K, V, S = std::collections::hash_map::RandomState> {
    table: &'a RobinTable<K, V, S>,
    next: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(table: &'a RobinTable<K, V, S>) -> Result<Self, Error> {
        table.lock_shared()?;
        Ok(Iter { table, next: 0 })
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tsize = self.table.storage().tsize();
        while self.next < tsize {
            let idx = self.next;
            self.next += 1;
            if !self.table.storage().bucket(idx).is_empty() {
                // `self.table` is itself `&'a RobinTable`, so this borrows
                // straight through for all of `'a` — no unsafe lifetime
                // extension needed here (unlike `IterMut`, which reborrows
                // a `&'a mut` down to the call).
                let entry = self.table.storage().entry_ref(idx);
                return Some((&entry.0, &entry.1));
            }
        }
        None
    }
}

impl<'a, K, V, S> Drop for Iter<'a, K, V, S> {
    fn drop(&mut self) {
        self.table.unlock_shared();
    }
}

/// An exclusive iterator over `(&K, &mut V)` pairs, which may also replace
/// or remove the entry it is currently positioned on.
///
/// No other iterator, shared or exclusive, may coexist with an `IterMut`.
pub struct IterMut<'a, K, V, S = std::collections::hash_map::RandomState> {
    table: &'a mut RobinTable<K, V, S>,
    next: usize,
    /// Index of the entry most recently returned by `next()`, if any and if
    /// it has not since been removed.
    current: Option<usize>,
}

impl<'a, K, V, S> IterMut<'a, K, V, S> {
    pub(crate) fn new(table: &'a mut RobinTable<K, V, S>) -> Result<Self, Error> {
        table.lock_exclusive()?;
        Ok(IterMut { table, next: 0, current: None })
    }

    /// Replaces the value of the entry last returned by `next()`, handing
    /// back the old value.
    ///
    /// Returns `Err(Error::IterNoLast)` if `next()` has not yet been called,
    /// or the current entry was already removed via [`remove_current`].
    ///
    /// [`remove_current`]: IterMut::remove_current
    pub fn replace_current(&mut self, value: V) -> Result<V, Error> {
        let idx = self.current.ok_or(Error::IterNoLast)?;
        let slot = self.table.storage_mut().entry_mut(idx);
        Ok(std::mem::replace(&mut slot.1, value))
    }

    /// Removes the entry last returned by `next()` via backward-shift
    /// deletion, returning its value.
    ///
    /// Backward-shift deletion pulls the displaced run following the
    /// removed slot one step closer to its ideal bucket, which means an
    /// entry the cursor has not yet reached can be shifted into the just-
    /// vacated slot; the cursor rewinds to that slot so it is still
    /// visited. If that displaced run wraps around the end of the table,
    /// it can instead reach back into slots already visited earlier in
    /// this pass; those are not revisited; a removal that provokes this
    /// requires a probe chain spanning nearly the whole table, which the
    /// PSL circuit breaker and load-factor resize keep rare in practice.
    ///
    /// Returns `Err(Error::IterNoLast)` if there is no current entry.
    pub fn remove_current(&mut self) -> Result<V, Error> {
        let idx = self.current.take().ok_or(Error::IterNoLast)?;
        let mask = self.table.mask();
        let psl_limit = self.table.psl_limit();
        let (_key, value) = crate::remove::remove_at(
            self.table.storage_mut(),
            mask,
            psl_limit,
            self.table.counters_mut(),
            idx,
        );
        // A backward shift may have pulled the entry that used to be at
        // `self.next` back into `idx`; if `idx` precedes the cursor, revisit
        // it so that shifted-back entry is not skipped.
        if idx < self.next {
            self.next = idx;
        }
        Ok(value)
    }
}

impl<'a, K, V, S> Iterator for IterMut<'a, K, V, S> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let tsize = self.table.storage().tsize();
        while self.next < tsize {
            let idx = self.next;
            self.next += 1;
            if !self.table.storage().bucket(idx).is_empty() {
                self.current = Some(idx);
                let entry = self.table.storage_mut().entry_mut(idx);
                // SAFETY: `IterMut` holds the table's only live borrow for
                // `'a` (enforced both by the borrow checker, since this is
                // an exclusive `&mut`, and by the runtime exclusive lock),
                // and each slot is yielded at most once per pass, so no two
                // `&mut` references to the same entry are ever live at once.
                let entry: &'a mut (K, V) = unsafe { &mut *(entry as *mut (K, V)) };
                return Some((&entry.0, &mut entry.1));
            }
        }
        self.current = None;
        None
    }
}

impl<'a, K, V, S> Drop for IterMut<'a, K, V, S> {
    fn drop(&mut self) {
        self.table.unlock_exclusive();
    }
}
