//! Keeper-level tests: pool lifecycle, batch execution, disabling
//! Run with: cargo test -p liquidity

use liquidity::*;

fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

fn addr(i: u32) -> Address {
    Address::new(format!("addr{i}"))
}

fn fund(k: &mut MemKeeper, who: &Address, amount: &str) {
    k.bank.fund(who, &coins(amount)).unwrap();
}

/// Fund the creator with deposit + creation fee, then create the pool
fn create_pool(k: &mut MemKeeper, creator: &Address, pair_id: u64, deposit: &str) -> Pool {
    let fee = k.params.pool_creation_fee();
    let required = coins(deposit).checked_add(&fee).unwrap();
    k.bank.fund(creator, &required).unwrap();
    k.create_pool(creator, pair_id, &coins(deposit)).unwrap()
}

fn deposit(k: &mut MemKeeper, who: &Address, pool_id: u64, amount: &str) -> Request {
    fund(k, who, amount);
    k.deposit_batch(who, pool_id, &coins(amount)).unwrap()
}

fn drain_reserve(k: &mut MemKeeper, pool: &Pool, to: &Address) {
    let all = k.bank.balances(&pool.reserve_address);
    k.bank.transfer(&pool.reserve_address, to, &all).unwrap();
}

#[test]
fn test_create_pool() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");

    let pool = k.get_pool(1).unwrap();
    assert!(!pool.disabled);
    assert_eq!(pool.pool_share_denom, pool_share_denom(pool.id));
    assert_eq!(pool.reserve_address, pool_reserve_address(pool.id));
    assert_eq!(
        k.bank.balances(&pool.reserve_address),
        coins("1000000denom1,1000000denom2")
    );
}

#[test]
fn test_pool_creation_fee() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();

    // Creator can cover the deposit but not the creation fee
    let creator = addr(1);
    fund(&mut k, &creator, "1000000denom1,1000000denom2");
    let before = k.clone();

    let err = k
        .create_pool(&creator, pair.id, &coins("1000000denom1,1000000denom2"))
        .unwrap_err();
    assert!(matches!(err, LiquidityError::InsufficientFunds { .. }));
    assert_eq!(k, before);
}

#[test]
fn test_create_pool_with_insufficient_deposit_amount() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();

    let creator = addr(1);
    let min = k.params.min_initial_deposit_amount();
    let x = Coin::new("denom1", min - 1);
    let y = Coin::new("denom2", min);
    let deposit = Coins::from_coins([x, y]).unwrap();
    let funding = deposit.checked_add(&k.params.pool_creation_fee()).unwrap();
    k.bank.fund(&creator, &funding).unwrap();
    let before = k.clone();

    let err = k.create_pool(&creator, pair.id, &deposit).unwrap_err();
    assert_eq!(err, LiquidityError::InsufficientDepositAmount { min });
    assert_eq!(k, before);
    assert_eq!(k.pools().count(), 0);
}

#[test]
fn test_create_same_pool() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pair2 = k.create_pair(&addr(0), "denom2", "denom1").unwrap();

    create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");

    // Same ordered pair: rejected
    let creator = addr(2);
    let deposit = coins("1000000denom1,1000000denom2");
    let funding = deposit.checked_add(&k.params.pool_creation_fee()).unwrap();
    k.bank.fund(&creator, &funding).unwrap();
    let err = k.create_pool(&creator, pair.id, &deposit).unwrap_err();
    assert_eq!(err, LiquidityError::PoolAlreadyExists(pair.id));

    // Reversed pair is a different pair
    let pool = create_pool(&mut k, &creator, pair2.id, "1000000denom2,1000000denom1");
    assert_eq!(pool.id, 2);
    assert_eq!(k.get_pool_by_reserve_pair("denom2", "denom1").map(|p| p.id), Some(2));
}

#[test]
fn test_disabled_pool_after_external_drain() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");

    drain_reserve(&mut k, &pool, &addr(2));

    // Not disabled until the next health check
    assert!(!k.get_pool(pool.id).unwrap().disabled);

    let depositor = addr(3);
    let req = deposit(&mut k, &depositor, pool.id, "1000000denom1,1000000denom2");
    let summary = k.end_block().unwrap();

    assert_eq!(summary.disabled_pools, vec![pool.id]);
    assert!(k.get_pool(pool.id).unwrap().disabled);
    let req = k.get_deposit_request(pool.id, req.id).unwrap();
    assert_eq!(req.status, RequestStatus::Failed);
    assert_eq!(req.failure, Some(FailureReason::DisabledPool));
    assert_eq!(k.bank.balances(&depositor), coins("1000000denom1,1000000denom2"));
}

#[test]
fn test_disabled_pool_after_full_withdrawal() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom3", "denom4").unwrap();
    let creator = addr(1);
    let pool = create_pool(&mut k, &creator, pair.id, "1000000denom3,1000000denom4");

    let shares = k.bank.balance(&creator, &pool.pool_share_denom);
    let req = k.withdraw_batch(&creator, pool.id, shares).unwrap();
    k.end_block();

    assert!(k.get_pool(pool.id).unwrap().disabled);
    let req = k.get_withdraw_request(pool.id, req.id).unwrap();
    assert_eq!(req.status, RequestStatus::Succeeded);
    assert_eq!(k.pool_share_supply(pool.id).unwrap(), 0);
    assert_eq!(k.bank.balances(&creator), coins("1000000denom3,1000000denom4"));
}

#[test]
fn test_deposit_to_disabled_pool() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");
    drain_reserve(&mut k, &pool, &addr(2));

    let depositor = addr(3);
    let req = deposit(&mut k, &depositor, pool.id, "1000000denom1,1000000denom2");
    let status = k.execute_deposit_request(pool.id, req.id).unwrap();
    assert_eq!(status, RequestStatus::Failed);
    assert_eq!(
        k.get_deposit_request(pool.id, req.id).unwrap().status,
        RequestStatus::Failed
    );

    // Refund already issued; purge only drops the record
    assert_eq!(k.bank.balances(&depositor), coins("1000000denom1,1000000denom2"));
    assert_eq!(k.purge_terminal_requests(), 1);

    let err = k
        .deposit_batch(&depositor, pool.id, &coins("1000000denom1,1000000denom2"))
        .unwrap_err();
    assert_eq!(err, LiquidityError::DisabledPool(pool.id));
}

#[test]
fn test_withdraw_from_disabled_pool() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let creator = addr(1);
    let pool = create_pool(&mut k, &creator, pair.id, "1000000denom1,1000000denom2");
    drain_reserve(&mut k, &pool, &creator);

    let shares = k.bank.balance(&creator, &pool.pool_share_denom);
    let req = k.withdraw_batch(&creator, pool.id, shares).unwrap();
    assert_eq!(k.bank.balance(&creator, &pool.pool_share_denom), 0);

    let status = k.execute_withdraw_request(pool.id, req.id).unwrap();
    assert_eq!(status, RequestStatus::Failed);
    assert_eq!(k.bank.balance(&creator, &pool.pool_share_denom), shares);

    k.purge_terminal_requests();
    let err = k.withdraw_batch(&creator, pool.id, shares).unwrap_err();
    assert_eq!(err, LiquidityError::DisabledPool(pool.id));
}

#[test]
fn test_create_pool_after_disabled() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let creator = addr(1);
    let pool = create_pool(&mut k, &creator, pair.id, "1000000denom1,1000000denom2");

    let shares = k.bank.balance(&creator, &pool.pool_share_denom);
    k.withdraw_batch(&creator, pool.id, shares).unwrap();
    k.end_block();

    // Every pool on the pair is disabled, so a new one may be created
    let pool2 = create_pool(&mut k, &addr(2), pair.id, "1000000denom1,1000000denom2");
    assert_eq!(pool2.id, 2);
    assert!(k.get_pool(1).unwrap().disabled);
    assert!(!k.get_pool(2).unwrap().disabled);
    assert_eq!(k.pools().filter(|p| !p.disabled).count(), 1);
    assert!(k.validate().is_ok());
}

#[test]
fn test_deposit_mints_proportional_shares_and_refunds_excess() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,2000000denom2");
    assert_eq!(k.pool_share_supply(pool.id).unwrap(), 1_000_000);

    let depositor = addr(2);
    let req = deposit(&mut k, &depositor, pool.id, "500000denom1,500000denom2");
    k.end_block();

    // Y is limiting: 500000 / 2000000 = 25% of the pool
    let req = k.get_deposit_request(pool.id, req.id).unwrap().clone();
    assert_eq!(req.status, RequestStatus::Succeeded);
    match req.kind {
        RequestKind::Deposit { accepted_coins, minted_pool_shares, .. } => {
            assert_eq!(accepted_coins, coins("250000denom1,500000denom2"));
            assert_eq!(minted_pool_shares, 250_000);
        }
        RequestKind::Withdraw { .. } => panic!("expected a deposit"),
    }
    assert_eq!(k.bank.balances(&depositor), coins("250000denom1,250000pool1"));
    assert_eq!(k.pool_reserves(pool.id).unwrap(), (1_250_000, 2_500_000));
    assert_eq!(k.pool_share_supply(pool.id).unwrap(), 1_250_000);
    assert!(k.bank.balances(&pool.escrow_address).is_empty());
}

#[test]
fn test_withdraw_pays_proportional_reserves() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let creator = addr(1);
    let pool = create_pool(&mut k, &creator, pair.id, "1000000denom1,2000000denom2");

    let req = k.withdraw_batch(&creator, pool.id, 250_000).unwrap();
    k.end_block();

    let req = k.get_withdraw_request(pool.id, req.id).unwrap();
    assert_eq!(req.status, RequestStatus::Succeeded);
    assert_eq!(k.bank.balance(&creator, "denom1"), 250_000);
    assert_eq!(k.bank.balance(&creator, "denom2"), 500_000);
    assert_eq!(k.bank.balance(&creator, "pool1"), 750_000);
    assert_eq!(k.pool_reserves(pool.id).unwrap(), (750_000, 1_500_000));
    assert_eq!(k.pool_share_supply(pool.id).unwrap(), 750_000);
    assert!(!k.get_pool(pool.id).unwrap().disabled);
}

#[test]
fn test_dust_deposit_fails_and_refunds() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,2000000denom2");

    let depositor = addr(2);
    let req = deposit(&mut k, &depositor, pool.id, "1denom1,1denom2");
    k.end_block();

    let req = k.get_deposit_request(pool.id, req.id).unwrap();
    assert_eq!(req.status, RequestStatus::Failed);
    assert_eq!(req.failure, Some(FailureReason::ZeroOutput));
    assert_eq!(k.bank.balances(&depositor), coins("1denom1,1denom2"));
    assert!(!k.get_pool(pool.id).unwrap().disabled);
}

#[test]
fn test_requests_execute_in_id_order_within_pool() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let creator = addr(1);
    let pool = create_pool(&mut k, &creator, pair.id, "1000000denom1,1000000denom2");

    // Request 1 empties the pool, so request 2 finds nothing to deposit into
    let shares = k.bank.balance(&creator, &pool.pool_share_denom);
    let w = k.withdraw_batch(&creator, pool.id, shares).unwrap();
    let depositor = addr(2);
    let d = deposit(&mut k, &depositor, pool.id, "1000denom1,1000denom2");
    assert!(w.id < d.id);

    let summary = k.process_batch();
    assert_eq!((summary.succeeded, summary.failed), (1, 1));
    assert_eq!(k.get_withdraw_request(pool.id, w.id).unwrap().status, RequestStatus::Succeeded);
    let d = k.get_deposit_request(pool.id, d.id).unwrap();
    assert_eq!(d.status, RequestStatus::Failed);
    assert_eq!(d.failure, Some(FailureReason::DisabledPool));
    assert_eq!(k.bank.balances(&depositor), coins("1000denom1,1000denom2"));
    assert!(k.get_pool(pool.id).unwrap().disabled);
}

#[test]
fn test_terminal_requests_purged_one_boundary_later() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");
    let req = deposit(&mut k, &addr(2), pool.id, "1000denom1,1000denom2");
    assert_eq!(req.accepted_at, 0);

    let first = k.end_block().unwrap();
    assert_eq!(first.purged, 0);
    assert_eq!(
        k.get_deposit_request(pool.id, req.id).unwrap().status,
        RequestStatus::Succeeded
    );

    let second = k.end_block().unwrap();
    assert_eq!(second.purged, 1);
    assert!(matches!(
        k.get_deposit_request(pool.id, req.id),
        Err(LiquidityError::DepositRequestNotFound { .. })
    ));

    // Ids keep counting after a purge
    let next = deposit(&mut k, &addr(2), pool.id, "1000denom1,1000denom2");
    assert_eq!(next.id, 2);
    assert_eq!(next.accepted_at, 2);
}

#[test]
fn test_pools_settle_independently() {
    let mut k = MemKeeper::with_defaults();
    let pair1 = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pair2 = k.create_pair(&addr(0), "denom3", "denom4").unwrap();
    let pool1 = create_pool(&mut k, &addr(1), pair1.id, "1000000denom1,1000000denom2");
    let pool2 = create_pool(&mut k, &addr(1), pair2.id, "1000000denom3,1000000denom4");

    drain_reserve(&mut k, &pool1, &addr(9));
    let d1 = deposit(&mut k, &addr(2), pool1.id, "1000denom1,1000denom2");
    let d2 = deposit(&mut k, &addr(2), pool2.id, "1000denom3,1000denom4");

    let summary = k.process_batch();
    assert_eq!(summary.disabled_pools, vec![pool1.id]);
    assert_eq!(k.get_deposit_request(pool1.id, d1.id).unwrap().status, RequestStatus::Failed);
    assert_eq!(k.get_deposit_request(pool2.id, d2.id).unwrap().status, RequestStatus::Succeeded);
    assert!(!k.get_pool(pool2.id).unwrap().disabled);
}

/// Host ledger that refuses to mint one share denom
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct MintRejectingBank {
    inner: Bank,
    rejected_mint: Option<String>,
}

impl ReserveLedger for MintRejectingBank {
    fn balance(&self, address: &Address, denom: &str) -> Amount {
        self.inner.balance(address, denom)
    }

    fn balances(&self, address: &Address) -> Coins {
        self.inner.balances(address)
    }

    fn supply(&self, denom: &str) -> Amount {
        self.inner.supply(denom)
    }

    fn apply(&mut self, ops: &[BankOp]) -> std::result::Result<(), BankError> {
        if let Some(denom) = &self.rejected_mint {
            let rejected = ops
                .iter()
                .any(|op| matches!(op, BankOp::Mint { coin, .. } if &coin.denom == denom));
            if rejected {
                return Err(BankError::Overflow(denom.clone()));
            }
        }
        self.inner.apply(ops)
    }
}

#[test]
fn test_ledger_rejection_fails_only_that_request() {
    let mut k = Keeper::new(Params::default(), MintRejectingBank::default());
    let pair1 = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pair2 = k.create_pair(&addr(0), "denom3", "denom4").unwrap();

    let creator = addr(1);
    let seed = "1000000denom1,1000000denom2,1000000denom3,1000000denom4,2000000stake";
    k.bank.inner.fund(&creator, &coins(seed)).unwrap();
    let pool1 = k
        .create_pool(&creator, pair1.id, &coins("1000000denom1,1000000denom2"))
        .unwrap();
    let pool2 = k
        .create_pool(&creator, pair2.id, &coins("1000000denom3,1000000denom4"))
        .unwrap();

    let depositor = addr(2);
    let offered = "1000denom1,1000denom2,1000denom3,1000denom4";
    k.bank.inner.fund(&depositor, &coins(offered)).unwrap();
    let d1 = k
        .deposit_batch(&depositor, pool1.id, &coins("1000denom1,1000denom2"))
        .unwrap();
    let d2 = k
        .deposit_batch(&depositor, pool2.id, &coins("1000denom3,1000denom4"))
        .unwrap();

    k.bank.rejected_mint = Some(pool1.pool_share_denom.clone());
    let reserves1 = k.pool_reserves(pool1.id).unwrap();
    let summary = k.process_batch();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.short_refunds, 0);
    assert!(summary.disabled_pools.is_empty());

    // Rejected settlement leaves no trace in pool 1
    let r1 = k.get_deposit_request(pool1.id, d1.id).unwrap();
    assert_eq!(r1.status, RequestStatus::Failed);
    assert_eq!(r1.failure, Some(FailureReason::LedgerFailure));
    assert!(r1.refund_shortfall.is_empty());
    assert_eq!(k.pool_reserves(pool1.id).unwrap(), reserves1);
    assert_eq!(k.pool_share_supply(pool1.id).unwrap(), 1_000_000);
    assert!(k.bank.balances(&pool1.escrow_address).is_empty());
    assert!(!k.get_pool(pool1.id).unwrap().disabled);

    // Pool 2 settles in the same batch
    let r2 = k.get_deposit_request(pool2.id, d2.id).unwrap();
    assert_eq!(r2.status, RequestStatus::Succeeded);
    assert_eq!(k.pool_reserves(pool2.id).unwrap(), (1_001_000, 1_001_000));
    assert_eq!(k.bank.balances(&depositor), coins("1000denom1,1000denom2,1000pool2"));
}

#[test]
fn test_overflowing_deposit_fails_and_refunds() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");

    let depositor = addr(2);
    let huge = Coins::from_coins([Coin::new("denom1", 1 << 127), Coin::new("denom2", 1 << 127)])
        .unwrap();
    k.bank.fund(&depositor, &huge).unwrap();
    let request = k.deposit_batch(&depositor, pool.id, &huge).unwrap();

    k.process_batch();
    let request = k.get_deposit_request(pool.id, request.id).unwrap();
    assert_eq!(request.status, RequestStatus::Failed);
    assert_eq!(request.failure, Some(FailureReason::Overflow));
    assert_eq!(k.bank.balances(&depositor), huge);
    assert_eq!(k.pool_reserves(pool.id).unwrap(), (1_000_000, 1_000_000));
}

#[test]
fn test_conservation_per_request() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1234567denom1,7654321denom2");

    let depositor = addr(2);
    let (x0, y0) = k.pool_reserves(pool.id).unwrap();
    deposit(&mut k, &depositor, pool.id, "33333denom1,99999denom2");
    k.end_block();
    let (x1, y1) = k.pool_reserves(pool.id).unwrap();

    let refund_x = k.bank.balance(&depositor, "denom1");
    let refund_y = k.bank.balance(&depositor, "denom2");
    assert_eq!(x1 + refund_x, x0 + 33_333);
    assert_eq!(y1 + refund_y, y0 + 99_999);
}

#[test]
fn test_state_round_trips_through_json() {
    let mut k = MemKeeper::with_defaults();
    let pair = k.create_pair(&addr(0), "denom1", "denom2").unwrap();
    let pool = create_pool(&mut k, &addr(1), pair.id, "1000000denom1,1000000denom2");
    deposit(&mut k, &addr(2), pool.id, "1000denom1,1000denom2");

    let json = serde_json::to_string(&k).unwrap();
    let restored: MemKeeper = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, k);
    assert!(restored.validate().is_ok());
}

#[test]
fn test_params_from_toml() {
    let params: Params = toml::from_str(
        r#"
        min_initial_deposit_amount = 500
        pool_creation_fee = "10stake"
        batch_size = 2
        "#,
    )
    .unwrap();
    assert_eq!(params.min_initial_deposit_amount, 500);
    assert_eq!(params.pool_creation_fee, coins("10stake"));
    assert_eq!(params.fee_collector, Address::new("fee_collector"));
    assert_eq!(params.batch_size, 2);
}
