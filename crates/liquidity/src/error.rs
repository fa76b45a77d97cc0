//! Admission-time errors
//!
//! Execution-time infeasibility never surfaces here: it is recorded on the
//! request as [`crate::FailureReason`] and refunded.

use thiserror::Error;

use crate::bank::BankError;
use crate::coin::{Amount, CoinParseError, Coins};
use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiquidityError {
    #[error("pool {0} not found")]
    PoolNotFound(u64),

    #[error("pair {0} not found")]
    PairNotFound(u64),

    #[error("pool already exists for pair {0}")]
    PoolAlreadyExists(u64),

    #[error("pair {base}/{quote} already exists")]
    PairAlreadyExists { base: String, quote: String },

    #[error("{address} has insufficient funds, needs {required}")]
    InsufficientFunds { address: Address, required: Coins },

    #[error("deposit amount is below the minimum initial deposit of {min}")]
    InsufficientDepositAmount { min: Amount },

    #[error("pool {0} is disabled")]
    DisabledPool(u64),

    #[error("invalid deposit coins: {0}")]
    InvalidDepositCoins(String),

    #[error("pool share amount must be positive")]
    InvalidPoolShareAmount,

    #[error("pair denoms must differ, got {0} twice")]
    SameDenoms(String),

    #[error(transparent)]
    InvalidDenom(#[from] CoinParseError),

    #[error("deposit request {id} of pool {pool_id} not found")]
    DepositRequestNotFound { pool_id: u64, id: u64 },

    #[error("withdraw request {id} of pool {pool_id} not found")]
    WithdrawRequestNotFound { pool_id: u64, id: u64 },

    #[error("store invariant violated: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Bank(#[from] BankError),
}

pub type Result<T> = std::result::Result<T, LiquidityError>;
