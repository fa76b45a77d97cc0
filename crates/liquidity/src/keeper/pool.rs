//! Pool registry

use log::info;

use crate::bank::{BankOp, ReserveLedger};
use crate::coin::{Amount, Coins};
use crate::error::{LiquidityError, Result};
use crate::params::ParamStore;
use crate::types::{Address, Pair, Pool};

use super::Keeper;

/// Coins must be exactly the pair's two denoms, both positive
pub(crate) fn check_pair_coins(pair: &Pair, coins: &Coins) -> Result<(Amount, Amount)> {
    let x = coins.amount_of(&pair.base_coin_denom);
    let y = coins.amount_of(&pair.quote_coin_denom);
    if coins.len() != 2 || x == 0 || y == 0 {
        return Err(LiquidityError::InvalidDepositCoins(format!(
            "expected positive {} and {}, got {:?}",
            pair.base_coin_denom,
            pair.quote_coin_denom,
            coins.to_string()
        )));
    }
    Ok((x, y))
}

impl<B, P> Keeper<B, P>
where
    B: ReserveLedger,
    P: ParamStore,
{
    /// Create a pool for `pair_id`, seeded by `deposit_coins` from `creator`
    ///
    /// Every check runs before the ledger is touched, and the seed transfer,
    /// fee payment and share mint go to the ledger as one atomic batch.
    pub fn create_pool(
        &mut self,
        creator: &Address,
        pair_id: u64,
        deposit_coins: &Coins,
    ) -> Result<Pool> {
        let pair = self.get_pair(pair_id)?.clone();
        let (x, y) = check_pair_coins(&pair, deposit_coins)?;

        let min = self.params.min_initial_deposit_amount();
        if x < min || y < min {
            return Err(LiquidityError::InsufficientDepositAmount { min });
        }

        if self.store.active_pool_id(pair_id).is_some() {
            return Err(LiquidityError::PoolAlreadyExists(pair_id));
        }

        let fee = self.params.pool_creation_fee();
        let required = deposit_coins.checked_add(&fee).ok_or_else(|| {
            LiquidityError::InvalidDepositCoins("deposit plus fee overflows".to_string())
        })?;
        if !self.bank.balances(creator).is_all_gte(&required) {
            return Err(LiquidityError::InsufficientFunds {
                address: creator.clone(),
                required,
            });
        }

        let shares = amm_model::initial_pool_shares(x, y)
            .map_err(|_| LiquidityError::InvalidDepositCoins(deposit_coins.to_string()))?;

        let pool = Pool::new(self.store.last_pool_id() + 1, pair_id);
        let mut ops = vec![BankOp::Transfer {
            from: creator.clone(),
            to: pool.reserve_address.clone(),
            coins: deposit_coins.clone(),
        }];
        if !fee.is_empty() {
            ops.push(BankOp::Transfer {
                from: creator.clone(),
                to: self.params.fee_collector(),
                coins: fee,
            });
        }
        ops.push(BankOp::Mint {
            to: creator.clone(),
            coin: pool.share_coin(shares),
        });
        self.bank.apply(&ops)?;

        self.store.set_pool(pool.clone());
        info!(
            "pool {} created on pair {} by {}: reserves {}, minted {}{}",
            pool.id, pair_id, creator, deposit_coins, shares, pool.pool_share_denom
        );
        Ok(pool)
    }

    pub fn get_pool(&self, id: u64) -> Result<&Pool> {
        self.store.pool(id).ok_or(LiquidityError::PoolNotFound(id))
    }

    /// The enabled pool for an ordered denom pair, if any
    pub fn get_pool_by_reserve_pair(&self, base: &str, quote: &str) -> Option<&Pool> {
        let pair = self.get_pair_by_denoms(base, quote)?;
        let pool_id = self.store.active_pool_id(pair.id)?;
        self.store.pool(pool_id)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.store.pools()
    }

    /// Current (x, y) reserves read from the ledger
    pub fn pool_reserves(&self, pool_id: u64) -> Result<(Amount, Amount)> {
        let pool = self.get_pool(pool_id)?;
        let pair = self.get_pair(pool.pair_id)?;
        Ok((
            self.bank.balance(&pool.reserve_address, &pair.base_coin_denom),
            self.bank.balance(&pool.reserve_address, &pair.quote_coin_denom),
        ))
    }

    pub fn pool_share_supply(&self, pool_id: u64) -> Result<Amount> {
        let pool = self.get_pool(pool_id)?;
        Ok(self.bank.supply(&pool.pool_share_denom))
    }

    /// Retire a pool. Idempotent; frees the pair for a new pool.
    pub(crate) fn disable_pool(&mut self, pool_id: u64) -> Result<()> {
        let mut pool = self.get_pool(pool_id)?.clone();
        if pool.disabled {
            return Ok(());
        }
        pool.disabled = true;
        self.store.set_pool(pool);
        info!("pool {pool_id} disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Address, Coins, LiquidityError, MemKeeper, ReserveLedger};

    fn coins(s: &str) -> Coins {
        s.parse().unwrap()
    }

    fn setup() -> (MemKeeper, Address) {
        let mut k = MemKeeper::with_defaults();
        let creator = Address::new("creator");
        k.create_pair(&creator, "denom1", "denom2").unwrap();
        k.bank
            .fund(&creator, &coins("1000000denom1,1000000denom2,1000000stake"))
            .unwrap();
        (k, creator)
    }

    #[test]
    fn test_create_pool_moves_funds_and_mints() {
        let (mut k, creator) = setup();
        let pool = k.create_pool(&creator, 1, &coins("1000000denom1,1000000denom2")).unwrap();

        assert_eq!(pool.id, 1);
        assert_eq!(k.pool_reserves(1).unwrap(), (1_000_000, 1_000_000));
        assert_eq!(k.pool_share_supply(1).unwrap(), 1_000_000);
        assert_eq!(k.bank.balance(&creator, "pool1"), 1_000_000);
        assert_eq!(k.bank.balance(&Address::new("fee_collector"), "stake"), 1_000_000);
        assert!(k.bank.balances(&creator).checked_sub(&coins("1000000pool1")).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_denoms_rejected() {
        let (mut k, creator) = setup();
        let err = k.create_pool(&creator, 1, &coins("1000000denom1,1000000stake")).unwrap_err();
        assert!(matches!(err, LiquidityError::InvalidDepositCoins(_)));
        let err = k.create_pool(&creator, 1, &coins("1000000denom1")).unwrap_err();
        assert!(matches!(err, LiquidityError::InvalidDepositCoins(_)));
    }

    #[test]
    fn test_unknown_pair_and_pool() {
        let (mut k, creator) = setup();
        let err = k.create_pool(&creator, 9, &coins("1000000denom1,1000000denom2")).unwrap_err();
        assert_eq!(err, LiquidityError::PairNotFound(9));
        assert_eq!(k.get_pool(1).unwrap_err(), LiquidityError::PoolNotFound(1));
    }

    #[test]
    fn test_lookup_by_reserve_pair() {
        let (mut k, creator) = setup();
        k.create_pool(&creator, 1, &coins("1000000denom1,1000000denom2")).unwrap();
        assert_eq!(k.get_pool_by_reserve_pair("denom1", "denom2").map(|p| p.id), Some(1));
        assert!(k.get_pool_by_reserve_pair("denom2", "denom1").is_none());

        k.disable_pool(1).unwrap();
        assert!(k.get_pool_by_reserve_pair("denom1", "denom2").is_none());
    }
}
