//! Persisted entities: pairs, pools and batch requests

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coin::{Amount, Coin, Coins};

/// Opaque account identifier supplied by the host ledger
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Module-owned addresses live under this prefix so they cannot collide
/// with one another; the host is expected to reject user addresses in it.
pub const MODULE_ADDRESS_PREFIX: &str = "liquidity/";

pub fn pool_reserve_address(pool_id: u64) -> Address {
    Address::new(format!("{MODULE_ADDRESS_PREFIX}pool/{pool_id}/reserve"))
}

pub fn pool_escrow_address(pool_id: u64) -> Address {
    Address::new(format!("{MODULE_ADDRESS_PREFIX}pool/{pool_id}/escrow"))
}

pub fn pool_share_denom(pool_id: u64) -> String {
    format!("pool{pool_id}")
}

/// Ordered denom pair. `(a, b)` and `(b, a)` are different pairs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: u64,
    pub base_coin_denom: String,
    pub quote_coin_denom: String,
}

/// Liquidity pool over one pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub pair_id: u64,

    /// Holds the X (base) and Y (quote) reserves
    pub reserve_address: Address,

    /// Holds escrowed deposit coins and pool shares of pending requests
    pub escrow_address: Address,

    pub pool_share_denom: String,

    /// Once set, never cleared
    pub disabled: bool,
}

impl Pool {
    pub fn new(id: u64, pair_id: u64) -> Self {
        Self {
            id,
            pair_id,
            reserve_address: pool_reserve_address(id),
            escrow_address: pool_escrow_address(id),
            pool_share_denom: pool_share_denom(id),
            disabled: false,
        }
    }

    pub fn share_coin(&self, amount: Amount) -> Coin {
        Coin::new(self.pool_share_denom.clone(), amount)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Succeeded,
    Failed,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Why an accepted request did not execute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Pool was disabled, or found depleted, when the batch ran
    DisabledPool,
    /// Computed share or reserve amount rounded down to zero
    ZeroOutput,
    /// Amounts too large for the pool math
    Overflow,
    /// The reserve ledger rejected the settlement transfer
    LedgerFailure,
}

/// Payload of a batch request, dispatched on by the batch executor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Deposit {
        deposit_coins: Coins,
        /// Coins moved into the reserve on success
        accepted_coins: Coins,
        /// Shares minted on success
        minted_pool_shares: Amount,
    },
    Withdraw {
        pool_share_amount: Amount,
        /// Reserve coins paid out on success
        withdrawn_coins: Coins,
    },
}

/// Deposit or withdraw request queued for the next batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub pool_id: u64,
    pub id: u64,
    pub requester: Address,
    /// Height at which the request was accepted
    pub accepted_at: u64,
    pub status: RequestStatus,
    pub failure: Option<FailureReason>,
    /// Escrow that could not be returned when the request failed
    #[serde(default, skip_serializing_if = "Coins::is_empty")]
    pub refund_shortfall: Coins,
    pub kind: RequestKind,
}

impl Request {
    pub fn is_deposit(&self) -> bool {
        matches!(self.kind, RequestKind::Deposit { .. })
    }

    pub fn is_withdraw(&self) -> bool {
        matches!(self.kind, RequestKind::Withdraw { .. })
    }

    /// Coins held in escrow for this request while it is pending
    pub fn escrowed_coins(&self, pool: &Pool) -> Coins {
        match &self.kind {
            RequestKind::Deposit { deposit_coins, .. } => deposit_coins.clone(),
            RequestKind::Withdraw { pool_share_amount, .. } => {
                Coins::from(pool.share_coin(*pool_share_amount))
            }
        }
    }
}
