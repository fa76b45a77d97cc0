//! Request ledger: batch deposit / withdraw admission and lookup

use log::info;

use crate::bank::ReserveLedger;
use crate::coin::{Amount, Coins};
use crate::error::{LiquidityError, Result};
use crate::params::ParamStore;
use crate::types::{Address, Pool, Request, RequestKind, RequestStatus};

use super::pool::check_pair_coins;
use super::Keeper;

impl<B, P> Keeper<B, P>
where
    B: ReserveLedger,
    P: ParamStore,
{
    /// Persisted pool that still accepts requests
    fn enabled_pool(&self, pool_id: u64) -> Result<Pool> {
        let pool = self.get_pool(pool_id)?;
        if pool.disabled {
            return Err(LiquidityError::DisabledPool(pool_id));
        }
        Ok(pool.clone())
    }

    /// Escrow `coins`, then record a pending request. Nothing is stored if
    /// the escrow transfer fails.
    fn accept_request(
        &mut self,
        requester: &Address,
        pool: &Pool,
        escrow: &Coins,
        kind: RequestKind,
    ) -> Result<Request> {
        if !self.bank.balances(requester).is_all_gte(escrow) {
            return Err(LiquidityError::InsufficientFunds {
                address: requester.clone(),
                required: escrow.clone(),
            });
        }
        self.bank.transfer(requester, &pool.escrow_address, escrow)?;

        let request = Request {
            pool_id: pool.id,
            id: self.store.next_request_id(pool.id),
            requester: requester.clone(),
            accepted_at: self.height,
            status: RequestStatus::Pending,
            failure: None,
            refund_shortfall: Coins::new(),
            kind,
        };
        self.store.set_request(request.clone());
        Ok(request)
    }

    /// Queue a deposit into `pool_id` for the next batch
    pub fn deposit_batch(
        &mut self,
        depositor: &Address,
        pool_id: u64,
        deposit_coins: &Coins,
    ) -> Result<Request> {
        let pool = self.enabled_pool(pool_id)?;
        let pair = self.get_pair(pool.pair_id)?;
        check_pair_coins(pair, deposit_coins)?;

        let kind = RequestKind::Deposit {
            deposit_coins: deposit_coins.clone(),
            accepted_coins: Coins::new(),
            minted_pool_shares: 0,
        };
        let request = self.accept_request(depositor, &pool, deposit_coins, kind)?;

        info!(
            "deposit request {}/{} accepted at {}: {} from {}",
            pool_id, request.id, self.height, deposit_coins, depositor
        );
        Ok(request)
    }

    /// Queue a withdrawal of `pool_share_amount` shares for the next batch
    pub fn withdraw_batch(
        &mut self,
        withdrawer: &Address,
        pool_id: u64,
        pool_share_amount: Amount,
    ) -> Result<Request> {
        let pool = self.enabled_pool(pool_id)?;
        if pool_share_amount == 0 {
            return Err(LiquidityError::InvalidPoolShareAmount);
        }

        let escrow = Coins::from(pool.share_coin(pool_share_amount));
        let kind = RequestKind::Withdraw {
            pool_share_amount,
            withdrawn_coins: Coins::new(),
        };
        let request = self.accept_request(withdrawer, &pool, &escrow, kind)?;

        info!(
            "withdraw request {}/{} accepted at {}: {} from {}",
            pool_id, request.id, self.height, escrow, withdrawer
        );
        Ok(request)
    }

    pub fn get_deposit_request(&self, pool_id: u64, id: u64) -> Result<&Request> {
        self.store
            .request(pool_id, id)
            .filter(|r| r.is_deposit())
            .ok_or(LiquidityError::DepositRequestNotFound { pool_id, id })
    }

    pub fn get_withdraw_request(&self, pool_id: u64, id: u64) -> Result<&Request> {
        self.store
            .request(pool_id, id)
            .filter(|r| r.is_withdraw())
            .ok_or(LiquidityError::WithdrawRequestNotFound { pool_id, id })
    }

    pub fn deposit_requests(&self, pool_id: u64) -> impl Iterator<Item = &Request> {
        self.store.requests(pool_id).filter(|r| r.is_deposit())
    }

    pub fn withdraw_requests(&self, pool_id: u64) -> impl Iterator<Item = &Request> {
        self.store.requests(pool_id).filter(|r| r.is_withdraw())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Address, Coins, LiquidityError, MemKeeper, ReserveLedger, RequestStatus};

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
        k.create_pool(&creator, 1, &coins("1000000denom1,1000000denom2")).unwrap();
        (k, creator)
    }

    #[test]
    fn test_deposit_is_escrowed_immediately() {
        let (mut k, _) = setup();
        let depositor = Address::new("depositor");
        k.bank.fund(&depositor, &coins("500denom1,500denom2")).unwrap();

        let req = k.deposit_batch(&depositor, 1, &coins("500denom1,500denom2")).unwrap();
        assert_eq!((req.pool_id, req.id), (1, 1));
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(k.bank.balances(&depositor).is_empty());

        let pool = k.get_pool(1).unwrap().clone();
        assert_eq!(k.bank.balances(&pool.escrow_address), coins("500denom1,500denom2"));
        // Reserves are untouched until the batch runs
        assert_eq!(k.pool_reserves(1).unwrap(), (1_000_000, 1_000_000));
    }

    #[test]
    fn test_request_ids_shared_across_kinds() {
        let (mut k, creator) = setup();
        let depositor = Address::new("depositor");
        k.bank.fund(&depositor, &coins("500denom1,500denom2")).unwrap();

        let d = k.deposit_batch(&depositor, 1, &coins("500denom1,500denom2")).unwrap();
        let w = k.withdraw_batch(&creator, 1, 10).unwrap();
        assert_eq!((d.id, w.id), (1, 2));

        assert!(k.get_deposit_request(1, 1).is_ok());
        assert!(matches!(
            k.get_deposit_request(1, 2),
            Err(LiquidityError::DepositRequestNotFound { pool_id: 1, id: 2 })
        ));
        assert!(k.get_withdraw_request(1, 2).is_ok());
        assert_eq!(k.deposit_requests(1).count(), 1);
        assert_eq!(k.withdraw_requests(1).count(), 1);
    }

    #[test]
    fn test_admission_failures_do_not_mutate() {
        let (mut k, creator) = setup();
        let depositor = Address::new("depositor");
        k.bank.fund(&depositor, &coins("10denom1,10denom2")).unwrap();
        let before = k.clone();

        assert!(matches!(
            k.deposit_batch(&depositor, 1, &coins("11denom1,10denom2")),
            Err(LiquidityError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            k.deposit_batch(&depositor, 1, &coins("10denom1")),
            Err(LiquidityError::InvalidDepositCoins(_))
        ));
        assert_eq!(
            k.deposit_batch(&depositor, 2, &coins("10denom1,10denom2")).unwrap_err(),
            LiquidityError::PoolNotFound(2)
        );
        assert_eq!(
            k.withdraw_batch(&creator, 1, 0).unwrap_err(),
            LiquidityError::InvalidPoolShareAmount
        );
        assert!(matches!(
            k.withdraw_batch(&creator, 1, 1_000_001),
            Err(LiquidityError::InsufficientFunds { .. })
        ));
        assert_eq!(k, before);
    }

    #[test]
    fn test_disabled_pool_rejects_requests() {
        let (mut k, creator) = setup();
        k.disable_pool(1).unwrap();
        assert_eq!(
            k.withdraw_batch(&creator, 1, 10).unwrap_err(),
            LiquidityError::DisabledPool(1)
        );
    }
}
