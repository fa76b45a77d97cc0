//! Coin amounts and multi-denom coin sets

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Token amount. Reserves, balances and share supplies are all unsigned.
pub type Amount = u128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinParseError {
    #[error("invalid denom: {0:?}")]
    InvalidDenom(String),

    #[error("invalid coin expression: {0:?}")]
    InvalidCoin(String),

    #[error("duplicate denom in coin set: {0}")]
    DuplicateDenom(String),
}

/// Denoms start with a letter, followed by 2-127 of `[a-zA-Z0-9/:._-]`.
pub fn validate_denom(denom: &str) -> Result<(), CoinParseError> {
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if first_ok && rest_ok && (3..=128).contains(&denom.len()) {
        Ok(())
    } else {
        Err(CoinParseError::InvalidDenom(denom.to_string()))
    }
}

/// A single denom/amount pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self { denom: denom.into(), amount }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = CoinParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CoinParseError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        let amount = amount
            .parse::<Amount>()
            .map_err(|_| CoinParseError::InvalidCoin(s.to_string()))?;
        validate_denom(denom)?;
        Ok(Coin::new(denom, amount))
    }
}

/// Sorted set of coins with at most one entry per denom and no zero entries.
///
/// Serializes as the canonical string form (`"100denom1,200denom2"`) so the
/// same value reads cleanly from TOML params and JSON state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Coins(BTreeMap<String, Amount>);

impl Coins {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build from coins, merging duplicates. Fails only on overflow.
    pub fn from_coins<I: IntoIterator<Item = Coin>>(coins: I) -> Option<Self> {
        let mut out = Coins::new();
        for coin in coins {
            out.add_coin(&coin)?;
        }
        Some(out)
    }

    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0.iter().map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    /// Add a coin in place. Returns `None` on overflow (self untouched).
    pub fn add_coin(&mut self, coin: &Coin) -> Option<()> {
        if coin.amount == 0 {
            return Some(());
        }
        let current = self.amount_of(&coin.denom);
        let next = current.checked_add(coin.amount)?;
        self.0.insert(coin.denom.clone(), next);
        Some(())
    }

    /// Subtract a coin in place. Returns `None` if it would go negative.
    pub fn sub_coin(&mut self, coin: &Coin) -> Option<()> {
        if coin.amount == 0 {
            return Some(());
        }
        let current = self.amount_of(&coin.denom);
        let next = current.checked_sub(coin.amount)?;
        if next == 0 {
            self.0.remove(&coin.denom);
        } else {
            self.0.insert(coin.denom.clone(), next);
        }
        Some(())
    }

    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.clone();
        for coin in other.iter() {
            out.add_coin(&coin)?;
        }
        Some(out)
    }

    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.clone();
        for coin in other.iter() {
            out.sub_coin(&coin)?;
        }
        Some(out)
    }

    /// True if every coin in `other` is covered by `self`.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.0.iter().all(|(denom, amount)| self.amount_of(denom) >= *amount)
    }

    /// Per-denom minimum of `self` and `other`, over the denoms of `self`
    pub fn min_each(&self, other: &Coins) -> Coins {
        let mut out = Coins::new();
        for (denom, amount) in &self.0 {
            let amount = (*amount).min(other.amount_of(denom));
            if amount > 0 {
                out.0.insert(denom.clone(), amount);
            }
        }
        out
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (denom, amount) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{amount}{denom}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Coins {
    type Err = CoinParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Coins::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let coin: Coin = part.parse()?;
            if out.0.contains_key(&coin.denom) {
                return Err(CoinParseError::DuplicateDenom(coin.denom));
            }
            if coin.amount > 0 {
                out.0.insert(coin.denom, coin.amount);
            }
        }
        Ok(out)
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        let mut out = Coins::new();
        if coin.amount > 0 {
            out.0.insert(coin.denom, coin.amount);
        }
        out
    }
}

impl Serialize for Coins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
