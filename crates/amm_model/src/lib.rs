//! AMM Model - Pure reserve/share arithmetic for batched liquidity pools
//!
//! This crate contains the proportional deposit and withdraw formulas used
//! by the liquidity engine when it settles a batch. Everything here is a
//! total function over `u128` amounts so the same code can be checked with
//! Kani (see `crates/proofs/kani`).
//!
//! The engine in `crates/liquidity` imports these functions directly; it
//! never re-derives share prices on its own.

#![no_std]

pub mod math;

pub use math::{
    deposit, initial_pool_shares, is_depleted, withdraw, DepositResult, WithdrawResult,
};

/// Error types for AMM operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmmError {
    /// A reserve or the pool share supply is zero
    InvalidReserves,
    /// Input amount is zero or exceeds what the pool can account for
    InvalidAmount,
    /// The computed output rounds down to zero
    ZeroOutput,
    /// Arithmetic overflow
    Overflow,
}
