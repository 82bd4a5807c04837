// Copyright 2016 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime failures and the contract-violation abort hook.
//!
//! Runtime failures (allocation, size limits, pathological hashing) are
//! reported through [`Error`] and `Result`. Contract violations (misuse that
//! indicates a programming error rather than a data-dependent failure) go
//! through [`abort`] instead, which never returns.

use std::fmt;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Failure modes that can be produced by a fallible table operation.
///
/// This type is `#[non_exhaustive]`: new variants may be added without a
/// semver break (matching `std::collections::TryReserveError`'s own stance on
/// future extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The backing allocation failed.
    Alloc,
    /// Reserved for parity with the original C library's 16 KiB entry-size
    /// ceiling. Unreachable in this crate, since `V`'s size is known at
    /// compile time and is never checked at runtime; kept so that a future
    /// fixed-capacity or `no_std` mode can raise it without a breaking API
    /// change.
    BadEsize,
    /// The requested or grown table size exceeds the maximum of 2^24
    /// buckets.
    TooBig,
    /// The PSL hard limit has been hit; the table's circuit breaker is
    /// tripped until a colliding entry is removed.
    BadHash,
    /// An iterator could not be created because of the current lock state.
    IterLock,
    /// Too many read-only iterators already exist.
    IterCount,
    /// The iterator is positioned before the first entry or past the last
    /// one, so there is no "current" entry to modify.
    IterNoLast,
}

impl Error {
    /// A short, human-readable description, mirroring the original library's
    /// `sht_msg()`.
    pub fn message(self) -> &'static str {
        match self {
            Error::Alloc => "memory allocation failed",
            Error::BadEsize => "entry type too large",
            Error::TooBig => "requested table size too large",
            Error::BadHash => "too many hash collisions",
            Error::IterLock => "can't acquire iterator lock",
            Error::IterCount => "table has too many iterators",
            Error::IterNoLast => "iterator has no current entry",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

/// Default abort hook: prints to stderr, same as the original's
/// `sht_err_print`.
fn default_hook(msg: &str) {
    eprintln!("fatal robin_table error: {}", msg);
}

// A `fn(&str)` pointer stored as a raw pointer so it can live in an
// `AtomicPtr`. Always points at a real `fn(&str)`, never null, so the loads
// in `abort` never need a null check.
static ABORT_HOOK: AtomicPtr<()> = AtomicPtr::new(default_hook as *mut ());

/// Replace the process-wide hook invoked before a contract violation aborts
/// the process.
///
/// Analogous to assigning the original library's `sht_abort_print` variable.
/// Install this once, at startup; it is not meant to be swapped mid-operation.
pub fn set_abort_hook(hook: fn(&str)) {
    ABORT_HOOK.store(hook as *mut (), Ordering::SeqCst);
}

/// Report a contract violation and terminate the process.
///
/// Used for misuse that indicates a bug in the caller (not a runtime
/// failure): the original library's `sht_abort` equivalent.
#[cold]
pub fn abort(msg: &str) -> ! {
    let hook_ptr = ABORT_HOOK.load(Ordering::SeqCst);
    // SAFETY: the only values ever stored are `fn(&str)` pointers.
    let hook: fn(&str) = unsafe { std::mem::transmute(hook_ptr) };
    hook(msg);
    std::process::abort();
}
