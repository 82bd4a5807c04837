// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use robin_table::RobinTable;

fn new_drop(c: &mut Criterion) {
    c.bench_function("new_drop", |b| {
        b.iter(|| {
            let t: RobinTable<i32, i32> = RobinTable::new();
            assert_eq!(t.len(), 0);
            criterion::black_box(&t);
        })
    });
}

fn new_insert_drop(c: &mut Criterion) {
    c.bench_function("new_insert_drop", |b| {
        b.iter(|| {
            let mut t = RobinTable::new();
            t.add(0, 0).unwrap();
            assert_eq!(t.len(), 1);
            criterion::black_box(&t);
        })
    });
}

fn grow_by_insertion(c: &mut Criterion) {
    let mut t: RobinTable<i32, i32> = RobinTable::new();
    for i in 1..1001 {
        t.add(i, i).unwrap();
    }
    criterion::black_box(&t);

    let mut k = 1001;
    c.bench_function("grow_by_insertion", |b| {
        b.iter(|| {
            t.add(k, k).unwrap();
            k += 1;
        })
    });
}

fn find_existing(c: &mut Criterion) {
    let mut t: RobinTable<i32, i32> = RobinTable::new();
    for i in 1..1001 {
        t.add(i, i).unwrap();
    }
    criterion::black_box(&t);

    c.bench_function("find_existing", |b| {
        b.iter(|| {
            for i in 1..1001 {
                criterion::black_box(t.contains_key(&i));
            }
        })
    });
}

fn find_nonexisting(c: &mut Criterion) {
    let mut t: RobinTable<i32, i32> = RobinTable::new();
    for i in 1..1001 {
        t.add(i, i).unwrap();
    }
    criterion::black_box(&t);

    c.bench_function("find_nonexisting", |b| {
        b.iter(|| {
            for i in 1001..2001 {
                criterion::black_box(t.contains_key(&i));
            }
        })
    });
}

fn get_remove_insert(c: &mut Criterion) {
    let mut t: RobinTable<i32, i32> = RobinTable::new();
    for i in 1..1001 {
        t.add(i, i).unwrap();
    }
    criterion::black_box(&t);

    let mut k = 1;
    c.bench_function("get_remove_insert", |b| {
        b.iter(|| {
            t.get(&(k + 400));
            t.get(&(k + 2000));
            t.pop(&k);
            t.add(k + 1000, k + 1000).unwrap();
            k += 1;
        })
    });
}

fn psl_limit_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("psl_limit");
    for limit in [16u8, 32, 64, MAX_PSL_FOR_BENCH] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                let mut t: RobinTable<i32, i32> = robin_table::RobinTableBuilder::new()
                    .psl_limit(limit)
                    .build()
                    .unwrap();
                for i in 0..2000 {
                    let _ = t.add(i, i);
                }
                criterion::black_box(&t);
            })
        });
    }
    group.finish();
}

const MAX_PSL_FOR_BENCH: u8 = 127;

criterion_group!(
    benches,
    new_drop,
    new_insert_drop,
    grow_by_insertion,
    find_existing,
    find_nonexisting,
    get_remove_insert,
    psl_limit_sweep,
);
criterion_main!(benches);
