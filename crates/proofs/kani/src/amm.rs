//! Kani proofs for proportional deposit / withdraw
//!
//! - **P1: Deposit Conservation** - accepted + refund == offered on both sides
//! - **P2: No Dilution** - minted shares are never worth more than the accepted coins
//! - **P3: Withdraw Bounds** - payouts never exceed the reserves or the burned share
//! - **P4: Full Exit** - burning the whole supply pays out both reserves exactly
//! - **P5: Depleted Pools** - a depleted pool admits neither deposits nor withdrawals

use amm_model::{deposit, initial_pool_shares, is_depleted, withdraw, AmmError};

/// Symbolic amount small enough for the solver, large enough to hit rounding
fn amount() -> u128 {
    kani::any::<u32>() as u128
}

/// P1: Deposit conservation
#[kani::proof]
fn p1_deposit_conserves_offered_coins() {
    let (x, y, s) = (amount(), amount(), amount());
    let (dx, dy) = (amount(), amount());

    if let Ok(r) = deposit(x, y, s, dx, dy) {
        assert!(r.accepted_x + r.refund_x == dx, "P1: x side must balance");
        assert!(r.accepted_y + r.refund_y == dy, "P1: y side must balance");
        assert!(r.accepted_x <= dx && r.accepted_y <= dy);
        assert!(r.minted > 0, "P1: success implies shares minted");
    }
}

/// P2: Existing holders are never diluted
///
/// minted / S <= accepted / reserve on both sides.
#[kani::proof]
fn p2_deposit_never_dilutes() {
    let (x, y, s) = (amount(), amount(), amount());
    let (dx, dy) = (amount(), amount());

    if let Ok(r) = deposit(x, y, s, dx, dy) {
        assert!(r.minted * x <= r.accepted_x * s, "P2: x side overpaid");
        assert!(r.minted * y <= r.accepted_y * s, "P2: y side overpaid");
    }
}

/// P3: Withdraw payouts are bounded
#[kani::proof]
fn p3_withdraw_bounded() {
    let (x, y, s) = (amount(), amount(), amount());
    let shares = amount();

    if let Ok(r) = withdraw(x, y, s, shares) {
        assert!(shares <= s);
        assert!(r.out_x <= x && r.out_y <= y, "P3: payout exceeds reserve");
        assert!(r.out_x * s <= x * shares, "P3: x payout exceeds share value");
        assert!(r.out_y * s <= y * shares, "P3: y payout exceeds share value");
        assert!(r.out_x > 0 && r.out_y > 0, "P3: success implies nonzero payout");
    }
}

/// P4: Burning the whole supply empties the pool
#[kani::proof]
fn p4_full_exit_takes_all_reserves() {
    let (x, y, s) = (amount(), amount(), amount());
    kani::assume(!is_depleted(x, y, s));

    let r = withdraw(x, y, s, s);
    assert!(r == Ok(amm_model::WithdrawResult { out_x: x, out_y: y }));
}

/// P5: Depleted pools reject every request
#[kani::proof]
fn p5_depleted_pool_rejects_requests() {
    let (x, y, s) = (amount(), amount(), amount());
    let (dx, dy, shares) = (amount(), amount(), amount());
    kani::assume(is_depleted(x, y, s));

    assert!(deposit(x, y, s, dx, dy) == Err(AmmError::InvalidReserves));
    assert!(withdraw(x, y, s, shares) == Err(AmmError::InvalidReserves));
}

/// Initial shares price the pool 1:1 against the smaller side
#[kani::proof]
fn initial_shares_match_smaller_side() {
    let (x, y) = (amount(), amount());

    match initial_pool_shares(x, y) {
        Ok(shares) => {
            assert!(shares > 0 && shares <= x && shares <= y);
            assert!(shares == x || shares == y);
            assert!(!is_depleted(x, y, shares));
        }
        Err(e) => assert!(e == AmmError::InvalidAmount && (x == 0 || y == 0)),
    }
}
