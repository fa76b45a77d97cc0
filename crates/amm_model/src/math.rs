//! Proportional pool math (constant-ratio deposit / withdraw)

use crate::AmmError;

/// Outcome of a proportional deposit against a live pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositResult {
    /// X amount moved into the reserve
    pub accepted_x: u128,

    /// Y amount moved into the reserve
    pub accepted_y: u128,

    /// X amount handed back to the depositor
    pub refund_x: u128,

    /// Y amount handed back to the depositor
    pub refund_y: u128,

    /// Pool shares minted to the depositor
    pub minted: u128,
}

/// Outcome of a proportional withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawResult {
    /// X amount paid out of the reserve
    pub out_x: u128,

    /// Y amount paid out of the reserve
    pub out_y: u128,
}

/// `a * b / c`, rounding down
#[inline]
fn mul_div_floor(a: u128, b: u128, c: u128) -> Result<u128, AmmError> {
    if c == 0 {
        return Err(AmmError::InvalidReserves);
    }
    let product = a.checked_mul(b).ok_or(AmmError::Overflow)?;
    Ok(product / c)
}

/// `a * b / c`, rounding up
#[inline]
fn mul_div_ceil(a: u128, b: u128, c: u128) -> Result<u128, AmmError> {
    if c == 0 {
        return Err(AmmError::InvalidReserves);
    }
    let product = a.checked_mul(b).ok_or(AmmError::Overflow)?;
    Ok(product.div_ceil(c))
}

/// A pool is depleted when either reserve or the share supply is zero.
#[inline]
pub fn is_depleted(x_reserve: u128, y_reserve: u128, share_supply: u128) -> bool {
    x_reserve == 0 || y_reserve == 0 || share_supply == 0
}

/// Shares minted to the creator of a fresh pool.
///
/// The first deposit prices shares 1:1 against the smaller side, which fixes
/// the initial share-to-reserve ratio for every later deposit.
pub fn initial_pool_shares(x_amount: u128, y_amount: u128) -> Result<u128, AmmError> {
    if x_amount == 0 || y_amount == 0 {
        return Err(AmmError::InvalidAmount);
    }
    Ok(x_amount.min(y_amount))
}

/// Calculate a constant-ratio deposit
///
/// - ratio = min(Δx / x, Δy / y)
/// - minted = floor(S · ratio)
/// - accepted = ceil(minted · reserve / S) on each side
/// - refund = offered - accepted
///
/// Rounding always favours the existing share holders: the depositor never
/// receives more shares than their accepted coins are worth.
///
/// # Arguments
/// * `x_reserve` - Current X reserve
/// * `y_reserve` - Current Y reserve
/// * `share_supply` - Current pool share supply (S)
/// * `dx` - X offered by the depositor
/// * `dy` - Y offered by the depositor
///
/// # Returns
/// * `DepositResult` with accepted, refunded and minted amounts
/// * `AmmError::ZeroOutput` if the deposit is below the pool's precision
pub fn deposit(
    x_reserve: u128,
    y_reserve: u128,
    share_supply: u128,
    dx: u128,
    dy: u128,
) -> Result<DepositResult, AmmError> {
    if is_depleted(x_reserve, y_reserve, share_supply) {
        return Err(AmmError::InvalidReserves);
    }
    if dx == 0 || dy == 0 {
        return Err(AmmError::InvalidAmount);
    }

    let minted_by_x = mul_div_floor(share_supply, dx, x_reserve)?;
    let minted_by_y = mul_div_floor(share_supply, dy, y_reserve)?;
    let minted = minted_by_x.min(minted_by_y);
    if minted == 0 {
        return Err(AmmError::ZeroOutput);
    }

    // minted <= S·Δ/reserve, so the ceiling never exceeds the offered amount
    let accepted_x = mul_div_ceil(minted, x_reserve, share_supply)?.min(dx);
    let accepted_y = mul_div_ceil(minted, y_reserve, share_supply)?.min(dy);

    Ok(DepositResult {
        accepted_x,
        accepted_y,
        refund_x: dx - accepted_x,
        refund_y: dy - accepted_y,
        minted,
    })
}

/// Calculate a proportional withdrawal
///
/// - Δx_out = floor(x · shares / S)
/// - Δy_out = floor(y · shares / S)
///
/// Burning the whole supply pays out both reserves exactly.
pub fn withdraw(
    x_reserve: u128,
    y_reserve: u128,
    share_supply: u128,
    shares: u128,
) -> Result<WithdrawResult, AmmError> {
    if is_depleted(x_reserve, y_reserve, share_supply) {
        return Err(AmmError::InvalidReserves);
    }
    if shares == 0 || shares > share_supply {
        return Err(AmmError::InvalidAmount);
    }

    let (out_x, out_y) = if shares == share_supply {
        (x_reserve, y_reserve)
    } else {
        (
            mul_div_floor(x_reserve, shares, share_supply)?,
            mul_div_floor(y_reserve, shares, share_supply)?,
        )
    };
    if out_x == 0 || out_y == 0 {
        return Err(AmmError::ZeroOutput);
    }

    Ok(WithdrawResult { out_x, out_y })
}
