// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Randomized workload checked against a `HashMap` oracle and against the
//! invariants `stats()` exposes publicly. The exact per-slot PSL/position
//! invariants are pinned down at the unit level in `probe.rs`/`remove.rs`,
//! which have access to `RawStorage`; this only checks what a caller of the
//! public API can observe.

use std::collections::HashMap as Oracle;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use robin_table::RobinTable;

fn check_stats_are_internally_consistent(t: &RobinTable<u32, u32>) {
    let stats = t.stats();
    assert_eq!(stats.len, t.len());
    assert!(stats.capacity >= stats.len);
    assert!(stats.mean_psl <= stats.peak_psl as f64 + 1e-9);
    if stats.len == 0 {
        assert_eq!(stats.mean_psl, 0.0);
    }
    // the table never runs an insert that pushes occupancy past its
    // threshold by more than the one in-flight insert that triggers resize.
    assert!(stats.load_factor <= 1.0);
}

#[test]
fn randomized_workload_matches_a_hashmap_oracle() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut oracle: Oracle<u32, u32> = Oracle::new();
    let mut t: RobinTable<u32, u32> = RobinTable::new();

    for step in 0..20_000u32 {
        let key = rng.gen_range(0..500u32);
        match rng.gen_range(0..5) {
            0 => {
                let was_absent = !oracle.contains_key(&key);
                let inserted = t.add(key, step).unwrap();
                assert_eq!(inserted, was_absent);
                if was_absent {
                    oracle.insert(key, step);
                }
            }
            1 => {
                let old = t.set(key, step).unwrap();
                let oracle_old = oracle.insert(key, step);
                assert_eq!(old, oracle_old);
            }
            2 => {
                let removed = t.pop(&key);
                let oracle_removed = oracle.remove(&key);
                assert_eq!(removed, oracle_removed);
            }
            3 => {
                assert_eq!(t.get(&key), oracle.get(&key));
            }
            _ => {
                assert_eq!(t.contains_key(&key), oracle.contains_key(&key));
            }
        }

        if step % 200 == 0 {
            assert_eq!(t.len(), oracle.len());
            check_stats_are_internally_consistent(&t);

            let mut seen: Vec<u32> = t.iter().unwrap().map(|(k, _)| *k).collect();
            seen.sort_unstable();
            let mut expected: Vec<u32> = oracle.keys().copied().collect();
            expected.sort_unstable();
            assert_eq!(seen, expected);
        }
    }

    for (k, v) in &oracle {
        assert_eq!(t.get(k), Some(v));
    }
    assert_eq!(t.len(), oracle.len());
}

#[test]
fn clear_then_reuse_behaves_like_a_fresh_table() {
    let mut t: RobinTable<u32, u32> = RobinTable::new();
    for i in 0..300u32 {
        t.add(i, i).unwrap();
    }
    t.clear();
    assert_eq!(t.len(), 0);
    assert_eq!(t.stats().mean_psl, 0.0);

    for i in 0..300u32 {
        t.add(i, i * 2).unwrap();
    }
    for i in 0..300u32 {
        assert_eq!(t.get(&i), Some(&(i * 2)));
    }
}
