//! Module parameters and the parameter-store seam

use serde::{Deserialize, Serialize};

use crate::coin::{Amount, Coin, Coins};
use crate::types::Address;

/// Read-only view of the host's parameter store.
pub trait ParamStore {
    /// Minimum amount of each reserve denom a new pool must be seeded with
    fn min_initial_deposit_amount(&self) -> Amount;

    /// Flat fee charged to the pool creator
    fn pool_creation_fee(&self) -> Coins;

    /// Account that receives pool creation fees
    fn fee_collector(&self) -> Address;

    /// Number of blocks per batch window (at least 1)
    fn batch_size(&self) -> u64;
}

/// Liquidity module parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Params {
    /// Kept at u64 so it reads from TOML integers
    pub min_initial_deposit_amount: u64,
    pub pool_creation_fee: Coins,
    pub fee_collector: Address,
    pub batch_size: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_initial_deposit_amount: 1_000_000,
            pool_creation_fee: Coins::from(Coin::new("stake", 1_000_000)),
            fee_collector: Address::new("fee_collector"),
            batch_size: 1,
        }
    }
}

impl ParamStore for Params {
    fn min_initial_deposit_amount(&self) -> Amount {
        Amount::from(self.min_initial_deposit_amount)
    }

    fn pool_creation_fee(&self) -> Coins {
        self.pool_creation_fee.clone()
    }

    fn fee_collector(&self) -> Address {
        self.fee_collector.clone()
    }

    fn batch_size(&self) -> u64 {
        self.batch_size.max(1)
    }
}
