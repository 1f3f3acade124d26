//! Leveraged Vault's Constants

use alloy_primitives::U256;

/// Scale used for fixed point arithmetic
pub const SCALE: u128 = 1_000_000_000_000_000_000; // e18
pub fn scale() -> U256 {
    U256::from(SCALE)
}

/// Divisor for basis-point parameters
pub const PERCENT_DIVISOR: u128 = 10_000;
pub fn percent_divisor() -> U256 {
    U256::from(PERCENT_DIVISOR)
}

/// Withdrawal security fee in basis points
pub const DEFAULT_SECURITY_FEE_BPS: u128 = 10; // 0.1%

/// Absolute ceiling for the withdrawal security fee
pub const MAX_SECURITY_FEE_BPS: u128 = 100; // 1%

/// Default slippage tolerance for unwinding collateral, in basis points
pub const DEFAULT_WITHDRAW_SLIPPAGE_TOLERANCE_BPS: u128 = 50; // 0.5%

/// Absolute ceiling for the withdrawal slippage tolerance
pub const MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS: u128 = 200; // 2%

/// Default slippage bound for reward swaps, in basis points
pub const DEFAULT_SWAP_SLIPPAGE_BPS: u128 = 50; // 0.5%

/// Absolute ceiling for the reward swap slippage bound
pub const MAX_SWAP_SLIPPAGE_BPS: u128 = 500; // 5%

/// Default allowed LTV drift before a rebalance triggers
const DEFAULT_LTV_DRIFT_RAW: u128 = 15 * SCALE / 1000; // 0.015 in e18
pub fn default_ltv_drift() -> U256 {
    U256::from(DEFAULT_LTV_DRIFT_RAW)
}

/// Damping factor applied to lever/delever step sizes.
/// Keeps every borrow strictly inside the market's collateral factor.
const LTV_SAFETY_MARGIN_RAW: u128 = 99 * SCALE / 100; // 99%
pub fn ltv_safety_margin() -> U256 {
    U256::from(LTV_SAFETY_MARGIN_RAW)
}

/// Hard cap on lever/delever iterations within one operation
pub const MAX_LEVERAGE_ITERATIONS: u8 = 15;

/// Hard cap on unwind iterations during a panic
pub const MAX_PANIC_ITERATIONS: u8 = 30;

/// Rolling window length of the harvest log
pub const HARVEST_LOG_LIMIT: usize = 30;

/// Default minimum number of seconds between two harvest log entries
pub const DEFAULT_HARVEST_LOG_CADENCE_SECS: u64 = 3_600;

/// Maximum number of retained journal entries
pub const MAX_JOURNAL_ENTRIES: usize = 500;

/// Base gas cost of a harvest call
pub const HARVEST_BASE_GAS: u64 = 600_000;

/// Gas cost of a single lever/delever step
pub const LEVERAGE_STEP_GAS: u64 = 220_000;

/// Seconds in a year, used to annualize per-harvest gains
pub fn seconds_per_year() -> U256 {
    U256::from(chrono::Duration::days(365).num_seconds() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_e18() {
        assert_eq!(SCALE, 10_u128.pow(18));
    }

    #[test]
    fn seconds_per_year_is_correct() {
        assert_eq!(seconds_per_year(), U256::from(31_536_000_u64));
    }

    #[test]
    fn safety_margin_is_below_scale() {
        assert!(ltv_safety_margin() < scale());
        assert!(ltv_safety_margin() > scale() / U256::from(2));
    }

    #[test]
    fn fee_defaults_respect_ceilings() {
        assert!(DEFAULT_SECURITY_FEE_BPS <= MAX_SECURITY_FEE_BPS);
        assert!(DEFAULT_WITHDRAW_SLIPPAGE_TOLERANCE_BPS <= MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS);
        assert!(DEFAULT_SWAP_SLIPPAGE_BPS <= MAX_SWAP_SLIPPAGE_BPS);
    }
}
