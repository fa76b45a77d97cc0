//! Reserve ledger adapter
//!
//! The engine never edits balances itself. Every settlement is expressed as a
//! list of [`BankOp`]s handed to [`ReserveLedger::apply`], which must apply all
//! of them or none.

use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coin::{Amount, Coin, Coins};
use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("{address} has insufficient balance for {required}")]
    InsufficientBalance { address: Address, required: Coin },

    #[error("supply of {0} would go negative")]
    InsufficientSupply(String),

    #[error("balance overflow for {0}")]
    Overflow(String),
}

/// Single ledger instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankOp {
    Transfer { from: Address, to: Address, coins: Coins },
    Mint { to: Address, coin: Coin },
    Burn { from: Address, coin: Coin },
}

/// Trait for the host ledger that owns balances
///
/// Implementations must make [`ReserveLedger::apply`] atomic: if any op
/// fails, no op in the batch may leave a trace.
pub trait ReserveLedger {
    fn balance(&self, address: &Address, denom: &str) -> Amount;

    fn balances(&self, address: &Address) -> Coins;

    fn supply(&self, denom: &str) -> Amount;

    fn apply(&mut self, ops: &[BankOp]) -> Result<(), BankError>;

    fn transfer(&mut self, from: &Address, to: &Address, coins: &Coins) -> Result<(), BankError> {
        self.apply(&[BankOp::Transfer {
            from: from.clone(),
            to: to.clone(),
            coins: coins.clone(),
        }])
    }

    fn mint(&mut self, to: &Address, coin: Coin) -> Result<(), BankError> {
        self.apply(&[BankOp::Mint { to: to.clone(), coin }])
    }

    fn burn(&mut self, from: &Address, coin: Coin) -> Result<(), BankError> {
        self.apply(&[BankOp::Burn { from: from.clone(), coin }])
    }
}

/// In-memory ledger used by tests, the CLI simulator and embedded hosts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    balances: BTreeMap<Address, Coins>,
    supply: Coins,
}

/// Accounts touched by a batch, staged until every op has succeeded
struct Staged<'a> {
    base: &'a Bank,
    balances: BTreeMap<Address, Coins>,
    supply: Coins,
}

impl<'a> Staged<'a> {
    fn new(base: &'a Bank) -> Self {
        Self {
            base,
            balances: BTreeMap::new(),
            supply: base.supply.clone(),
        }
    }

    fn account(&mut self, address: &Address) -> &mut Coins {
        let base = self.base;
        self.balances
            .entry(address.clone())
            .or_insert_with(|| base.balances(address))
    }

    fn credit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        self.account(address)
            .add_coin(coin)
            .ok_or_else(|| BankError::Overflow(coin.denom.clone()))
    }

    fn debit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        self.account(address)
            .sub_coin(coin)
            .ok_or_else(|| BankError::InsufficientBalance {
                address: address.clone(),
                required: coin.clone(),
            })
    }

    fn step(&mut self, op: &BankOp) -> Result<(), BankError> {
        match op {
            BankOp::Transfer { from, to, coins } => {
                for coin in coins.iter() {
                    self.debit(from, &coin)?;
                    self.credit(to, &coin)?;
                }
            }
            BankOp::Mint { to, coin } => {
                self.supply
                    .add_coin(coin)
                    .ok_or_else(|| BankError::Overflow(coin.denom.clone()))?;
                self.credit(to, coin)?;
            }
            BankOp::Burn { from, coin } => {
                self.debit(from, coin)?;
                self.supply
                    .sub_coin(coin)
                    .ok_or_else(|| BankError::InsufficientSupply(coin.denom.clone()))?;
            }
        }
        Ok(())
    }
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint coins straight into an account (genesis funding, faucets, tests)
    pub fn fund(&mut self, address: &Address, coins: &Coins) -> Result<(), BankError> {
        let ops: Vec<BankOp> = coins
            .iter()
            .map(|coin| BankOp::Mint { to: address.clone(), coin })
            .collect();
        self.apply(&ops)
    }

    /// All non-empty accounts, ascending by address
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Coins)> {
        self.balances.iter()
    }

    pub fn total_supply(&self) -> &Coins {
        &self.supply
    }
}

impl ReserveLedger for Bank {
    fn balance(&self, address: &Address, denom: &str) -> Amount {
        self.balances
            .get(address)
            .map(|coins| coins.amount_of(denom))
            .unwrap_or(0)
    }

    fn balances(&self, address: &Address) -> Coins {
        self.balances.get(address).cloned().unwrap_or_default()
    }

    fn supply(&self, denom: &str) -> Amount {
        self.supply.amount_of(denom)
    }

    fn apply(&mut self, ops: &[BankOp]) -> Result<(), BankError> {
        let mut staged = Staged::new(self);
        for op in ops {
            staged.step(op)?;
        }
        let Staged { balances, supply, .. } = staged;

        for (address, coins) in balances {
            if coins.is_empty() {
                self.balances.remove(&address);
            } else {
                self.balances.insert(address, coins);
            }
        }
        self.supply = supply;
        trace!("bank: applied {} ops", ops.len());
        Ok(())
    }
}
