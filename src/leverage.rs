//! Leverage controller.
//!
//! Decides, on every capital-affecting event, whether to lever up,
//! delever or hold, and executes bounded step loops against the market.
//! Every loop carries a hard iteration cap and a strict-progress check;
//! a step that cannot move the position closer to its goal aborts with
//! `MarketLiquidityInsufficient` instead of retrying forever.

use alloy_primitives::U256;

use crate::{
    constants::{ltv_safety_margin, percent_divisor, scale},
    error::{arithmetic_err, VaultError, VaultResult},
    market::LendingMarket,
    position,
    vault::VaultSettings,
};

/// Logical position of the current LTV relative to the target band
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeverageState {
    Balanced,
    OverLeveraged,
    UnderLeveraged,
}

/// Classifies `current` against `target ± drift`
pub fn classify(current: U256, target: U256, drift: U256) -> LeverageState {
    if current > target.saturating_add(drift) {
        LeverageState::OverLeveraged
    } else if current < target.saturating_sub(drift) {
        LeverageState::UnderLeveraged
    } else {
        LeverageState::Balanced
    }
}

fn gap(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// The market collateral factor damped by the safety margin. All borrow
/// and redeem headroom is measured against this limit, never the raw
/// factor, so a step can never brush the liquidation boundary.
fn collateral_factor_limit<M: LendingMarket>(market: &M) -> VaultResult<U256> {
    Ok(market
        .max_collateral_factor()?
        .saturating_mul(ltv_safety_margin())
        / scale())
}

/// Collateral that can be redeemed while the remaining supply still
/// covers the outstanding debt within the damped collateral factor
fn redeem_headroom(supplied: U256, borrowed: U256, limit: U256) -> VaultResult<U256> {
    if borrowed.is_zero() {
        return Ok(supplied);
    }
    let locked = borrowed
        .saturating_mul(scale())
        .checked_div(limit)
        .ok_or(VaultError::MarketLiquidityInsufficient)?;
    Ok(supplied.saturating_sub(locked))
}

/// Redeems `amount` and enforces the configured slippage tolerance on the
/// realized value
fn redeem_checked<M: LendingMarket>(
    market: &mut M,
    amount: U256,
    tolerance_bps: U256,
) -> VaultResult<U256> {
    let min_out =
        amount.saturating_mul(percent_divisor().saturating_sub(tolerance_bps)) / percent_divisor();
    let actual = market.redeem(amount)?;
    if actual < min_out {
        return Err(VaultError::SlippageExceeded);
    }
    Ok(actual)
}

/// Supplies any idle asset, then levers or delevers until the LTV sits
/// inside the drift band around the target. Returns the number of
/// iterations consumed out of `budget`.
pub fn rebalance<M: LendingMarket>(
    market: &mut M,
    settings: &VaultSettings,
    strategy_idle: &mut U256,
    budget: u8,
) -> VaultResult<u8> {
    if !strategy_idle.is_zero() {
        market.supply(*strategy_idle)?;
        *strategy_idle = U256::ZERO;
    }
    let limit = collateral_factor_limit(market)?;
    // A collateral factor that dropped below the operator target caps the
    // goal; the market state wins over the configured parameter.
    let goal = settings.target_ltv.min(limit);
    let drift = settings.allowed_drift;
    let mut prev_gap: Option<U256> = None;
    let mut used = 0_u8;
    loop {
        let supplied = market.supplied_balance()?;
        let borrowed = market.borrowed_balance()?;
        if supplied.is_zero() {
            return Ok(used);
        }
        let ltv = position::ltv_ratio(supplied, borrowed)?;
        if classify(ltv, goal, drift) == LeverageState::Balanced {
            return Ok(used);
        }
        if used >= budget {
            return Err(VaultError::MarketLiquidityInsufficient);
        }
        let current_gap = gap(ltv, goal);
        if let Some(prev) = prev_gap {
            if current_gap >= prev {
                return Err(VaultError::MarketLiquidityInsufficient);
            }
        }
        prev_gap = Some(current_gap);
        match classify(ltv, goal, drift) {
            LeverageState::UnderLeveraged => lever_step(market, supplied, borrowed, goal, limit)?,
            LeverageState::OverLeveraged => delever_step(
                market,
                supplied,
                borrowed,
                goal,
                limit,
                settings.withdraw_slippage_tolerance_bps,
                strategy_idle,
            )?,
            LeverageState::Balanced => unreachable!(),
        }
        used += 1;
    }
}

/// Frees asset from the position until the strategy's idle balance covers
/// `needed`, delevering only as much as the request demands. Returns the
/// iterations consumed.
pub fn free_liquidity<M: LendingMarket>(
    market: &mut M,
    settings: &VaultSettings,
    strategy_idle: &mut U256,
    needed: U256,
    budget: u8,
) -> VaultResult<u8> {
    let limit = collateral_factor_limit(market)?;
    let tolerance = settings.withdraw_slippage_tolerance_bps;
    for used in 0..budget {
        if *strategy_idle >= needed {
            return Ok(used);
        }
        let shortfall = needed - *strategy_idle;
        let supplied = market.supplied_balance()?;
        let borrowed = market.borrowed_balance()?;
        if supplied.saturating_sub(borrowed) < shortfall {
            return Err(VaultError::UnwindShortfall);
        }
        let headroom = redeem_headroom(supplied, borrowed, limit)?;
        if headroom >= shortfall {
            // Exactly the shortfall; never unwind more than needed
            let actual = redeem_checked(market, shortfall, tolerance)?;
            *strategy_idle = strategy_idle.saturating_add(actual);
            continue;
        }
        // Delever a slice to raise the redeemable headroom
        let slice = headroom.min(borrowed).min(market.available_liquidity()?);
        if slice.is_zero() {
            return Err(VaultError::MarketLiquidityInsufficient);
        }
        let actual = redeem_checked(market, slice, tolerance)?;
        if actual.is_zero() {
            return Err(VaultError::MarketLiquidityInsufficient);
        }
        let repay = actual.min(borrowed);
        market.repay(repay)?;
        if actual > repay {
            *strategy_idle = strategy_idle.saturating_add(actual - repay);
        }
    }
    if *strategy_idle >= needed {
        Ok(budget)
    } else {
        Err(VaultError::UnwindShortfall)
    }
}

/// Full unwind into idle asset with no drift target and no slippage gate.
/// Best-effort: used for damage control, callers keep whatever progress
/// was made even when the loop cannot finish.
pub fn unwind_all<M: LendingMarket>(
    market: &mut M,
    strategy_idle: &mut U256,
    budget: u8,
) -> VaultResult<()> {
    let limit = collateral_factor_limit(market)?;
    for _ in 0..budget {
        let supplied = market.supplied_balance()?;
        let borrowed = market.borrowed_balance()?;
        if supplied.is_zero() && borrowed.is_zero() {
            return Ok(());
        }
        if borrowed.is_zero() {
            let slice = supplied.min(market.available_liquidity()?);
            if slice.is_zero() {
                return Err(VaultError::MarketLiquidityInsufficient);
            }
            let actual = market.redeem(slice)?;
            *strategy_idle = strategy_idle.saturating_add(actual);
            continue;
        }
        let headroom = redeem_headroom(supplied, borrowed, limit)?;
        let slice = headroom.min(borrowed).min(market.available_liquidity()?);
        if slice.is_zero() {
            return Err(VaultError::MarketLiquidityInsufficient);
        }
        let actual = market.redeem(slice)?;
        if actual.is_zero() {
            return Err(VaultError::MarketLiquidityInsufficient);
        }
        let repay = actual.min(borrowed);
        market.repay(repay)?;
        if actual > repay {
            *strategy_idle = strategy_idle.saturating_add(actual - repay);
        }
    }
    let supplied = market.supplied_balance()?;
    let borrowed = market.borrowed_balance()?;
    if supplied.is_zero() && borrowed.is_zero() {
        Ok(())
    } else {
        Err(VaultError::MarketLiquidityInsufficient)
    }
}

fn lever_step<M: LendingMarket>(
    market: &mut M,
    supplied: U256,
    borrowed: U256,
    goal: U256,
    limit: U256,
) -> VaultResult<()> {
    // Borrow that would land exactly on the goal if resupplied:
    // x = (goal * supplied - borrowed) / (1 - goal)
    let num = goal
        .saturating_mul(supplied)
        .saturating_sub(borrowed.saturating_mul(scale()));
    let den = scale().saturating_sub(goal);
    let full = num
        .checked_div(den)
        .ok_or_else(|| arithmetic_err("Target LTV was not below 1."))?;
    let damped = full.saturating_mul(ltv_safety_margin()) / scale();
    let borrow_headroom = supplied.saturating_mul(limit) / scale();
    let borrow_headroom = borrow_headroom.saturating_sub(borrowed);
    let step = damped.min(borrow_headroom).min(market.available_liquidity()?);
    if step.is_zero() {
        return Err(VaultError::MarketLiquidityInsufficient);
    }
    market.borrow(step)?;
    market.supply(step)?;
    Ok(())
}

fn delever_step<M: LendingMarket>(
    market: &mut M,
    supplied: U256,
    borrowed: U256,
    goal: U256,
    limit: U256,
    tolerance_bps: U256,
    strategy_idle: &mut U256,
) -> VaultResult<()> {
    // Redemption that would land exactly on the goal once repaid:
    // r = (borrowed - goal * supplied) / (1 - goal)
    let num = borrowed
        .saturating_mul(scale())
        .saturating_sub(goal.saturating_mul(supplied));
    let den = scale().saturating_sub(goal);
    let wanted = num
        .checked_div(den)
        .ok_or_else(|| arithmetic_err("Target LTV was not below 1."))?;
    let headroom = redeem_headroom(supplied, borrowed, limit)?;
    let slice = wanted.min(headroom).min(market.available_liquidity()?);
    if slice.is_zero() {
        return Err(VaultError::MarketLiquidityInsufficient);
    }
    let actual = redeem_checked(market, slice, tolerance_bps)?;
    let repay = actual.min(borrowed);
    if !repay.is_zero() {
        market.repay(repay)?;
    }
    if actual > repay {
        *strategy_idle = strategy_idle.saturating_add(actual - repay);
    }
    Ok(())
}
