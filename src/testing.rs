//! Deterministic in-memory collaborators for tests.
//!
//! `SimMarket` is a bookkeeping model of a money market, not a price
//! simulator: balances move exactly as asked, subject to the collateral
//! factor and the market's payout cash. Supplied collateral is tracked
//! separately from that cash so tests can exhaust market liquidity
//! without touching the position.

use alloy_primitives::{Address, U256};

use crate::{
    constants::{percent_divisor, scale},
    error::{VaultError, VaultResult},
    market::{AccessGate, Action, FeeSink, LendingMarket, RewardSwapper},
};

/// `n` whole units of the base asset in e18
pub fn eth(n: u64) -> U256 {
    U256::from(n) * scale()
}

/// The e18 fixed-point value of `num / den`
pub fn ratio(num: u64, den: u64) -> U256 {
    scale() * U256::from(num) / U256::from(den)
}

#[derive(Clone, Debug)]
pub struct SimMarket {
    pub supplied: U256,
    pub borrowed: U256,
    /// Base asset the market can pay out right now
    pub cash: U256,
    /// Raw collateral factor as an e18 ratio
    pub collateral_factor: U256,
    /// Rewards returned by the next `claim_rewards` call
    pub pending_reward: U256,
    /// Haircut applied to every redemption, in basis points
    pub redeem_haircut_bps: U256,
}

impl Default for SimMarket {
    fn default() -> Self {
        Self {
            supplied: U256::ZERO,
            borrowed: U256::ZERO,
            cash: eth(1_000_000_000_000),
            collateral_factor: ratio(9, 10),
            pending_reward: U256::ZERO,
            redeem_haircut_bps: U256::ZERO,
        }
    }
}

impl LendingMarket for SimMarket {
    fn supply(&mut self, amount: U256) -> VaultResult<()> {
        self.supplied += amount;
        Ok(())
    }

    fn borrow(&mut self, amount: U256) -> VaultResult<()> {
        let borrowed = self.borrowed + amount;
        if borrowed * scale() > self.supplied * self.collateral_factor {
            return Err(VaultError::Market(
                "borrow exceeds the collateral limit".to_string(),
            ));
        }
        if amount > self.cash {
            return Err(VaultError::Market("market cash exhausted".to_string()));
        }
        self.borrowed = borrowed;
        self.cash -= amount;
        Ok(())
    }

    fn repay(&mut self, amount: U256) -> VaultResult<()> {
        if amount > self.borrowed {
            return Err(VaultError::Market("repaying more than owed".to_string()));
        }
        self.borrowed -= amount;
        self.cash += amount;
        Ok(())
    }

    fn redeem(&mut self, amount: U256) -> VaultResult<U256> {
        if amount > self.supplied {
            return Err(VaultError::Market(
                "redeeming more than supplied".to_string(),
            ));
        }
        let remaining = self.supplied - amount;
        if self.borrowed * scale() > remaining * self.collateral_factor {
            return Err(VaultError::Market(
                "redemption would undercollateralize the position".to_string(),
            ));
        }
        let received =
            amount * (percent_divisor() - self.redeem_haircut_bps) / percent_divisor();
        if received > self.cash {
            return Err(VaultError::Market("market cash exhausted".to_string()));
        }
        self.supplied = remaining;
        self.cash -= received;
        Ok(received)
    }

    fn claim_rewards(&mut self) -> VaultResult<U256> {
        Ok(std::mem::take(&mut self.pending_reward))
    }

    fn supplied_balance(&self) -> VaultResult<U256> {
        Ok(self.supplied)
    }

    fn borrowed_balance(&self) -> VaultResult<U256> {
        Ok(self.borrowed)
    }

    fn max_collateral_factor(&self) -> VaultResult<U256> {
        Ok(self.collateral_factor)
    }

    fn available_liquidity(&self) -> VaultResult<U256> {
        Ok(self.cash)
    }
}

/// Fixed-rate reward swapper; the realized output always equals the quote
#[derive(Clone, Debug)]
pub struct SimSwapper {
    /// Realized output per reward token, in basis points of par
    pub rate_bps: U256,
}

impl Default for SimSwapper {
    fn default() -> Self {
        Self {
            rate_bps: percent_divisor(),
        }
    }
}

impl RewardSwapper for SimSwapper {
    fn quote(&self, amount: U256) -> VaultResult<U256> {
        Ok(amount * self.rate_bps / percent_divisor())
    }

    fn swap(&mut self, amount: U256, min_out: U256) -> VaultResult<U256> {
        let actual = amount * self.rate_bps / percent_divisor();
        if actual < min_out {
            return Err(VaultError::SlippageExceeded);
        }
        Ok(actual)
    }
}

/// Accumulating fee recipient
#[derive(Clone, Debug, Default)]
pub struct SimSink {
    pub received: U256,
}

impl FeeSink for SimSink {
    fn receive(&mut self, amount: U256) -> VaultResult<()> {
        self.received += amount;
        Ok(())
    }
}

/// All-or-nothing permission gate
#[derive(Clone, Debug)]
pub struct SimGate {
    pub authorized: bool,
}

impl Default for SimGate {
    fn default() -> Self {
        Self { authorized: true }
    }
}

impl AccessGate for SimGate {
    fn is_authorized(&self, _caller: Address, _action: Action) -> bool {
        self.authorized
    }
}
