//! Batch executor
//!
//! Runs once per processing boundary:
//! 1. purge requests that reached a terminal status in an earlier round
//! 2. for each pool with pending requests (ascending id): health check,
//!    execute pending requests in ascending id order, health re-check
//!
//! Refunds are issued when a request is marked Failed, never at purge.

use amm_model::{is_depleted, AmmError};
use log::{debug, error, info, warn};

use crate::bank::{BankOp, ReserveLedger};
use crate::coin::{Coin, Coins};
use crate::error::{LiquidityError, Result};
use crate::params::ParamStore;
use crate::types::{FailureReason, Pair, Pool, Request, RequestKind, RequestStatus};

use super::Keeper;

/// What one boundary did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub height: u64,
    pub purged: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failed requests whose escrow could not be fully returned
    pub short_refunds: usize,
    /// Pools disabled during this boundary, ascending
    pub disabled_pools: Vec<u64>,
}

impl From<AmmError> for FailureReason {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::InvalidReserves => FailureReason::DisabledPool,
            AmmError::Overflow => FailureReason::Overflow,
            AmmError::InvalidAmount | AmmError::ZeroOutput => FailureReason::ZeroOutput,
        }
    }
}

/// Settlement planned for one request
enum Plan {
    Settle {
        ops: Vec<BankOp>,
        kind: RequestKind,
    },
    Fail(FailureReason),
}

impl<B, P> Keeper<B, P>
where
    B: ReserveLedger,
    P: ParamStore,
{
    /// Advance one block; run the batch when the window closes
    pub fn end_block(&mut self) -> Option<BatchSummary> {
        self.height += 1;
        if self.height % self.params.batch_size() == 0 {
            Some(self.process_batch())
        } else {
            None
        }
    }

    /// Settle every pending request against current reserves
    pub fn process_batch(&mut self) -> BatchSummary {
        let mut summary = BatchSummary {
            height: self.height,
            purged: self.purge_terminal_requests(),
            ..BatchSummary::default()
        };

        for pool_id in self.store.pools_with_pending_requests() {
            if let Err(err) = self.execute_pool_round(pool_id, &mut summary) {
                error!("batch {}: pool {} skipped: {}", self.height, pool_id, err);
            }
        }

        info!(
            "batch {}: {} succeeded, {} failed, {} short refunds, {} purged, disabled {:?}",
            summary.height,
            summary.succeeded,
            summary.failed,
            summary.short_refunds,
            summary.purged,
            summary.disabled_pools
        );
        summary
    }

    /// Drop requests already in a terminal status
    pub fn purge_terminal_requests(&mut self) -> usize {
        let purged = self.store.delete_terminal_requests();
        if purged > 0 {
            debug!("purged {purged} terminal requests");
        }
        purged
    }

    fn execute_pool_round(&mut self, pool_id: u64, summary: &mut BatchSummary) -> Result<()> {
        let was_disabled = self.get_pool(pool_id)?.disabled;
        let healthy = self.refresh_pool_health(pool_id)?;

        for id in self.store.pending_request_ids(pool_id) {
            let outcome = if healthy {
                self.execute_request(pool_id, id)
            } else {
                self.fail_request(pool_id, id, FailureReason::DisabledPool)
            };
            match outcome {
                Ok(RequestStatus::Succeeded) => summary.succeeded += 1,
                Ok(RequestStatus::Failed) => {
                    summary.failed += 1;
                    let short = self
                        .store
                        .request(pool_id, id)
                        .is_some_and(|r| !r.refund_shortfall.is_empty());
                    if short {
                        summary.short_refunds += 1;
                    }
                }
                Ok(RequestStatus::Pending) => {
                    error!("batch {}: request {pool_id}/{id} left pending", self.height)
                }
                Err(err) => error!("batch {}: request {pool_id}/{id}: {err}", self.height),
            }
        }

        if healthy {
            self.refresh_pool_health(pool_id)?;
        }
        if !was_disabled && self.get_pool(pool_id)?.disabled {
            summary.disabled_pools.push(pool_id);
        }
        Ok(())
    }

    /// Re-derive the disabled flag from ledger balances.
    /// Returns whether the pool can still serve requests.
    pub fn refresh_pool_health(&mut self, pool_id: u64) -> Result<bool> {
        if self.get_pool(pool_id)?.disabled {
            return Ok(false);
        }
        let (x, y) = self.pool_reserves(pool_id)?;
        let supply = self.pool_share_supply(pool_id)?;
        if is_depleted(x, y, supply) {
            debug!("pool {pool_id} depleted: x={x} y={y} supply={supply}");
            self.disable_pool(pool_id)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Execute one pending deposit request outside a full batch
    pub fn execute_deposit_request(&mut self, pool_id: u64, id: u64) -> Result<RequestStatus> {
        self.get_deposit_request(pool_id, id)?;
        self.execute_request(pool_id, id)
    }

    /// Execute one pending withdraw request outside a full batch
    pub fn execute_withdraw_request(&mut self, pool_id: u64, id: u64) -> Result<RequestStatus> {
        self.get_withdraw_request(pool_id, id)?;
        self.execute_request(pool_id, id)
    }

    fn stored_request(&self, pool_id: u64, id: u64) -> Result<Request> {
        self.store
            .request(pool_id, id)
            .cloned()
            .ok_or_else(|| LiquidityError::Corrupted(format!("request {pool_id}/{id} vanished")))
    }

    fn execute_request(&mut self, pool_id: u64, id: u64) -> Result<RequestStatus> {
        let request = self.stored_request(pool_id, id)?;
        if request.status.is_terminal() {
            return Ok(request.status);
        }
        if !self.refresh_pool_health(pool_id)? {
            return self.fail_request(pool_id, id, FailureReason::DisabledPool);
        }

        let pool = self.get_pool(pool_id)?.clone();
        let pair = self.get_pair(pool.pair_id)?.clone();
        let (x, y) = self.pool_reserves(pool_id)?;
        let supply = self.pool_share_supply(pool_id)?;

        let plan = match &request.kind {
            RequestKind::Deposit { deposit_coins, .. } => {
                plan_deposit(&pool, &pair, &request, deposit_coins, (x, y, supply))
            }
            RequestKind::Withdraw { pool_share_amount, .. } => {
                plan_withdraw(&pool, &pair, &request, *pool_share_amount, (x, y, supply))
            }
        };

        let (ops, kind) = match plan {
            Plan::Settle { ops, kind } => (ops, kind),
            Plan::Fail(reason) => return self.fail_request(pool_id, id, reason),
        };
        if let Err(err) = self.bank.apply(&ops) {
            error!("request {pool_id}/{id}: settlement rejected by ledger: {err}");
            return self.fail_request(pool_id, id, FailureReason::LedgerFailure);
        }

        debug!("request {pool_id}/{id} succeeded: {kind:?}");
        self.store.set_request(Request {
            status: RequestStatus::Succeeded,
            kind,
            ..request
        });
        Ok(RequestStatus::Succeeded)
    }

    /// Refund the escrow and mark the request Failed.
    ///
    /// The request always becomes terminal. If the escrow account was drained
    /// from outside, whatever it still holds (up to what this request
    /// escrowed) is returned and the rest is recorded as `refund_shortfall`.
    fn fail_request(
        &mut self,
        pool_id: u64,
        id: u64,
        reason: FailureReason,
    ) -> Result<RequestStatus> {
        let request = self.stored_request(pool_id, id)?;
        if request.status.is_terminal() {
            return Ok(request.status);
        }
        let pool = self.get_pool(pool_id)?.clone();
        let owed = request.escrowed_coins(&pool);

        let refund = match self.bank.transfer(&pool.escrow_address, &request.requester, &owed) {
            Ok(()) => owed.clone(),
            Err(err) => {
                let held = owed.min_each(&self.bank.balances(&pool.escrow_address));
                error!(
                    "request {pool_id}/{id}: refund of {owed} rejected ({err}), returning {held}"
                );
                match self.bank.transfer(&pool.escrow_address, &request.requester, &held) {
                    Ok(()) => held,
                    Err(err) => {
                        error!("request {pool_id}/{id}: partial refund rejected: {err}");
                        Coins::new()
                    }
                }
            }
        };
        let refund_shortfall = owed.checked_sub(&refund).unwrap_or_default();

        warn!(
            "request {}/{} failed ({:?}), refunded {} to {}",
            pool_id, id, reason, refund, request.requester
        );
        self.store.set_request(Request {
            status: RequestStatus::Failed,
            failure: Some(reason),
            refund_shortfall,
            ..request
        });
        Ok(RequestStatus::Failed)
    }
}

fn plan_deposit(
    pool: &Pool,
    pair: &Pair,
    request: &Request,
    deposit_coins: &Coins,
    (x, y, supply): (u128, u128, u128),
) -> Plan {
    let dx = deposit_coins.amount_of(&pair.base_coin_denom);
    let dy = deposit_coins.amount_of(&pair.quote_coin_denom);
    let result = match amm_model::deposit(x, y, supply, dx, dy) {
        Ok(result) => result,
        Err(err) => return Plan::Fail(err.into()),
    };

    let pair_coins = |a, b| {
        Coins::from_coins([
            Coin::new(pair.base_coin_denom.clone(), a),
            Coin::new(pair.quote_coin_denom.clone(), b),
        ])
        .unwrap_or_default()
    };
    let accepted = pair_coins(result.accepted_x, result.accepted_y);
    let refund = pair_coins(result.refund_x, result.refund_y);

    let mut ops = vec![BankOp::Transfer {
        from: pool.escrow_address.clone(),
        to: pool.reserve_address.clone(),
        coins: accepted.clone(),
    }];
    if !refund.is_empty() {
        ops.push(BankOp::Transfer {
            from: pool.escrow_address.clone(),
            to: request.requester.clone(),
            coins: refund,
        });
    }
    ops.push(BankOp::Mint {
        to: request.requester.clone(),
        coin: pool.share_coin(result.minted),
    });

    Plan::Settle {
        ops,
        kind: RequestKind::Deposit {
            deposit_coins: deposit_coins.clone(),
            accepted_coins: accepted,
            minted_pool_shares: result.minted,
        },
    }
}

fn plan_withdraw(
    pool: &Pool,
    pair: &Pair,
    request: &Request,
    pool_share_amount: u128,
    (x, y, supply): (u128, u128, u128),
) -> Plan {
    let result = match amm_model::withdraw(x, y, supply, pool_share_amount) {
        Ok(result) => result,
        Err(err) => return Plan::Fail(err.into()),
    };
    let withdrawn = Coins::from_coins([
        Coin::new(pair.base_coin_denom.clone(), result.out_x),
        Coin::new(pair.quote_coin_denom.clone(), result.out_y),
    ])
    .unwrap_or_default();

    let ops = vec![
        BankOp::Burn {
            from: pool.escrow_address.clone(),
            coin: pool.share_coin(pool_share_amount),
        },
        BankOp::Transfer {
            from: pool.reserve_address.clone(),
            to: request.requester.clone(),
            coins: withdrawn.clone(),
        },
    ];

    Plan::Settle {
        ops,
        kind: RequestKind::Withdraw {
            pool_share_amount,
            withdrawn_coins: withdrawn,
        },
    }
}
