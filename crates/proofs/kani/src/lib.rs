//! Kani harnesses for the pool share math
//!
//! Run with `cargo kani -p proofs-kani`. The harnesses are compiled only
//! under Kani; a normal build of this crate is empty.

#![no_std]

#[cfg(kani)]
mod amm;
