// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fills a table to just under its resize threshold, over and over, and
//! prints the PSL distribution each round settles into.

use rand::Rng;
use robin_table::RobinTable;

fn main() {
    let mut t: RobinTable<u64, ()> = RobinTable::new();
    assert_eq!(t.len(), 0);
    let mut rng = rand::thread_rng();
    let len = 2 << 16;
    let usable_cap = (len as f64 * 0.833) as usize;

    for round in 0..200 {
        while t.len() < usable_cap {
            t.add(rng.gen(), ()).unwrap();
        }
        let stats = t.stats();
        println!(
            "{}: len={} capacity={} load_factor={:.3} peak_psl={} mean_psl={:.3} at_psl_limit={}",
            round,
            stats.len,
            stats.capacity,
            stats.load_factor,
            stats.peak_psl,
            stats.mean_psl,
            stats.at_psl_limit,
        );
        t.clear();
    }
}
