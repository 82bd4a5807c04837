// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Construction-time configuration.
//!
//! The original C library exposes `sht_set_lft`/`sht_set_psl_limit`/
//! `sht_set_hash_ctx` as setters callable any time after `sht_init`. This
//! crate collapses that into one builder so a table's configuration is
//! frozen for its whole lifetime, which is also what lets [`RobinTable`]
//! avoid having to re-check configuration validity on every insert.

use std::collections::hash_map::RandomState;

use crate::bucket::MAX_PSL;
use crate::error::Error;
use crate::table::RobinTable;

/// Builds a [`RobinTable`] with non-default load factor, PSL limit, initial
/// capacity, or hasher.
pub struct RobinTableBuilder<S = RandomState> {
    lft: u8,
    psl_limit: u8,
    capacity: usize,
    hash_builder: S,
}

impl Default for RobinTableBuilder<RandomState> {
    fn default() -> Self {
        RobinTableBuilder {
            lft: 85,
            psl_limit: MAX_PSL,
            capacity: 0,
            hash_builder: RandomState::new(),
        }
    }
}

impl RobinTableBuilder<RandomState> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> RobinTableBuilder<S> {
    /// Sets the load factor threshold, as a percentage in `1..=100`, at
    /// which the table doubles in size. Panics if `lft` is zero or greater
    /// than 100.
    pub fn load_factor_percent(mut self, lft: u8) -> Self {
        assert!((1..=100).contains(&lft), "load factor percent must be in 1..=100");
        self.lft = lft;
        self
    }

    /// Sets the maximum probe sequence length a single entry may reach
    /// before the table refuses further inserts with [`Error::BadHash`].
    /// Panics if `psl_limit` exceeds [`MAX_PSL`], the width of the packed
    /// bucket field.
    pub fn psl_limit(mut self, psl_limit: u8) -> Self {
        assert!(psl_limit <= MAX_PSL, "psl_limit exceeds the 7-bit packed field");
        self.psl_limit = psl_limit;
        self
    }

    /// Reserves room for at least this many entries before the table's
    /// first resize.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Uses a specific hasher builder instead of [`RandomState`].
    pub fn hasher<S2>(self, hash_builder: S2) -> RobinTableBuilder<S2> {
        RobinTableBuilder {
            lft: self.lft,
            psl_limit: self.psl_limit,
            capacity: self.capacity,
            hash_builder,
        }
    }

    /// Consumes the builder, allocating the table's initial storage if a
    /// capacity was requested.
    pub fn build<K, V>(self) -> Result<RobinTable<K, V, S>, Error> {
        RobinTable::from_builder_parts(self.hash_builder, self.lft, self.psl_limit, self.capacity)
    }
}
