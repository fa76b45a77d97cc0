//! Liquidity keeper: the handle every operation runs through
//!
//! All state (pairs, pools, requests) lives in an explicit [`Store`] owned by
//! the keeper; balances live behind the [`ReserveLedger`] seam and
//! configuration behind [`ParamStore`]. Nothing is process-global, so tests
//! and simulations can run any number of independent keepers.

mod batch;
mod pair;
mod pool;
mod request;

pub use batch::BatchSummary;

use serde::{Deserialize, Serialize};

use crate::bank::{Bank, ReserveLedger};
use crate::error::Result;
use crate::params::{ParamStore, Params};
use crate::store::Store;

/// Liquidity module state - generic over the ledger and parameter store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keeper<B = Bank, P = Params> {
    /// Parameter store
    pub params: P,

    /// Reserve ledger (source of truth for balances and share supply)
    pub bank: B,

    /// Pairs, pools and batch requests
    pub store: Store,

    /// Current block height; stamped on accepted requests
    pub height: u64,
}

/// Keeper backed by the in-memory bank and static params
pub type MemKeeper = Keeper<Bank, Params>;

impl<B, P> Keeper<B, P>
where
    B: ReserveLedger,
    P: ParamStore,
{
    pub fn new(params: P, bank: B) -> Self {
        Self {
            params,
            bank,
            store: Store::new(),
            height: 0,
        }
    }

    /// Check store invariants (used after loading persisted state)
    pub fn validate(&self) -> Result<()> {
        self.store.validate()
    }
}

impl MemKeeper {
    /// Keeper with default params and an empty bank
    pub fn with_defaults() -> Self {
        Self::new(Params::default(), Bank::new())
    }
}
