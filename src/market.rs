//! External collaborator seams.
//!
//! The vault consumes the lending market, the reward swap path, the fee
//! sink and the permission gate through these narrow traits. Every call
//! may fail or return less value than requested and is checked by the
//! caller; nothing here is assumed to succeed exactly as asked.

use alloy_primitives::{Address, U256};

use crate::error::VaultResult;

/// Gated operations consulted through the access gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    SetTargetLtv,
    SetWithdrawSlippageTolerance,
    UpdateHarvestLogCadence,
    Pause,
    Unpause,
    Panic,
}

/// Supply/borrow side of the money market, denominated in base-asset units
#[cfg_attr(test, mockall::automock)]
pub trait LendingMarket {
    /// Supplies `amount` of the base asset as collateral
    fn supply(&mut self, amount: U256) -> VaultResult<()>;

    /// Borrows `amount` of the base asset against the supplied collateral
    fn borrow(&mut self, amount: U256) -> VaultResult<()>;

    /// Repays up to `amount` of the outstanding debt
    fn repay(&mut self, amount: U256) -> VaultResult<()>;

    /// Redeems `amount` of collateral and returns the value actually received
    fn redeem(&mut self, amount: U256) -> VaultResult<U256>;

    /// Claims accrued rewards and returns the reward-token amount
    fn claim_rewards(&mut self) -> VaultResult<U256>;

    /// Collateral currently supplied, in base-asset units
    fn supplied_balance(&self) -> VaultResult<U256>;

    /// Debt currently outstanding, in base-asset units
    fn borrowed_balance(&self) -> VaultResult<U256>;

    /// The market's collateral factor as an e18 ratio
    fn max_collateral_factor(&self) -> VaultResult<U256>;

    /// Base asset the market can pay out right now
    fn available_liquidity(&self) -> VaultResult<U256>;
}

/// Converts claimed reward tokens into the base asset
#[cfg_attr(test, mockall::automock)]
pub trait RewardSwapper {
    /// Expected base-asset output for `amount` of reward tokens
    fn quote(&self, amount: U256) -> VaultResult<U256>;

    /// Swaps `amount` of reward tokens, failing with `SlippageExceeded`
    /// when the realized output falls below `min_out`
    fn swap(&mut self, amount: U256, min_out: U256) -> VaultResult<U256>;
}

/// Treasury-side recipient of withdrawal fees
#[cfg_attr(test, mockall::automock)]
pub trait FeeSink {
    fn receive(&mut self, amount: U256) -> VaultResult<()>;
}

/// Capability check consulted before parameter-changing operations
#[cfg_attr(test, mockall::automock)]
pub trait AccessGate {
    fn is_authorized(&self, caller: Address, action: Action) -> bool;
}
