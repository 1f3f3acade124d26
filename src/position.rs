//! Pure read path over the market position. Never mutates anything.

use alloy_primitives::U256;

use crate::{
    constants::scale,
    error::{arithmetic_err, VaultResult},
    market::LendingMarket,
};

/// LTV as an e18 ratio; zero when nothing is supplied
pub fn ltv_ratio(supplied: U256, borrowed: U256) -> VaultResult<U256> {
    if supplied.is_zero() {
        return Ok(U256::ZERO);
    }
    borrowed
        .saturating_mul(scale())
        .checked_div(supplied)
        .ok_or_else(|| arithmetic_err("Supplied collateral was zero."))
}

/// Current loan-to-value ratio of the market position
pub fn current_ltv<M: LendingMarket>(market: &M) -> VaultResult<U256> {
    let supplied = market.supplied_balance()?;
    let borrowed = market.borrowed_balance()?;
    ltv_ratio(supplied, borrowed)
}

/// Total balance under management: idle asset held by the vault and the
/// strategy plus the net collateral position. An underwater position
/// contributes zero rather than underflowing.
pub fn managed_balance<M: LendingMarket>(
    market: &M,
    vault_idle: U256,
    strategy_idle: U256,
) -> VaultResult<U256> {
    let supplied = market.supplied_balance()?;
    let borrowed = market.borrowed_balance()?;
    let net_position = supplied.saturating_sub(borrowed);
    Ok(vault_idle
        .saturating_add(strategy_idle)
        .saturating_add(net_position))
}
