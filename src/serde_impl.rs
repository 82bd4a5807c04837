// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `serde` support, gated behind the `serde` feature. A table serializes as
//! a sequence of `(K, V)` pairs, the same representation `std`'s `HashMap`
//! and `hashbrown::HashMap` use, so data interchanges with either.

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::table::RobinTable;

impl<K, V, S> Serialize for RobinTable<K, V, S>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<Se>(&self, serializer: Se) -> Result<Se::Ok, Se::Error>
    where
        Se: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (k, v) in self.iter().map_err(serde::ser::Error::custom)? {
            seq.serialize_element(&(k, v))?;
        }
        seq.end()
    }
}

struct RobinTableVisitor<K, V, S> {
    marker: PhantomData<fn() -> RobinTable<K, V, S>>,
}

impl<'de, K, V, S> Visitor<'de> for RobinTableVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = RobinTable<K, V, S>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of key-value pairs")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut table = RobinTable::with_hasher(S::default());
        while let Some((key, value)) = seq.next_element::<(K, V)>()? {
            table.set(key, value).map_err(serde::de::Error::custom)?;
        }
        Ok(table)
    }
}

impl<'de, K, V, S> Deserialize<'de> for RobinTable<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(RobinTableVisitor { marker: PhantomData })
    }
}
