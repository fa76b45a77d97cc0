//! Batch-settled liquidity pools
//!
//! Pools hold a reserve pair for one ordered denom pair and issue a pool
//! share token. Deposits and withdrawals are accepted immediately (funds go
//! to escrow) but settle only when the host calls
//! [`Keeper::process_batch`] at a processing boundary. Each boundary also
//! re-derives every touched pool's health from ledger balances and retires
//! pools whose reserves or share supply reached zero.
//!
//! Failure is two-phase:
//! - admission errors ([`LiquidityError`]) are returned synchronously and
//!   mutate nothing
//! - execution infeasibility marks the request Failed and refunds escrow

#![forbid(unsafe_code)]

pub mod bank;
pub mod coin;
pub mod error;
pub mod keeper;
pub mod params;
pub mod store;
pub mod types;

pub use bank::{Bank, BankError, BankOp, ReserveLedger};
pub use coin::{Amount, Coin, CoinParseError, Coins};
pub use error::{LiquidityError, Result};
pub use keeper::{BatchSummary, Keeper, MemKeeper};
pub use params::{ParamStore, Params};
pub use store::Store;
pub use types::*;
