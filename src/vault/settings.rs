//! Operator-facing vault settings.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        default_ltv_drift, scale, DEFAULT_HARVEST_LOG_CADENCE_SECS, DEFAULT_SECURITY_FEE_BPS,
        DEFAULT_SWAP_SLIPPAGE_BPS, DEFAULT_WITHDRAW_SLIPPAGE_TOLERANCE_BPS, MAX_SECURITY_FEE_BPS,
        MAX_SWAP_SLIPPAGE_BPS, MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS,
    },
    error::{VaultError, VaultResult},
};

/// Mutable protocol parameters, changed only through gated setters on the
/// vault
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Target loan-to-value ratio, e18
    pub target_ltv: U256,
    /// Acceptable deviation around the target before rebalancing triggers, e18
    pub allowed_drift: U256,
    /// Withdrawal fee in basis points, routed to the fee sink
    pub security_fee_bps: U256,
    /// Worst acceptable realized value of a single unwind step, in basis points
    pub withdraw_slippage_tolerance_bps: U256,
    /// Worst acceptable reward swap output, in basis points
    pub swap_slippage_bps: U256,
    /// Minimum seconds between two harvest log entries
    pub harvest_log_cadence_secs: u64,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            target_ltv: U256::ZERO,
            allowed_drift: default_ltv_drift(),
            security_fee_bps: U256::from(DEFAULT_SECURITY_FEE_BPS),
            withdraw_slippage_tolerance_bps: U256::from(DEFAULT_WITHDRAW_SLIPPAGE_TOLERANCE_BPS),
            swap_slippage_bps: U256::from(DEFAULT_SWAP_SLIPPAGE_BPS),
            harvest_log_cadence_secs: DEFAULT_HARVEST_LOG_CADENCE_SECS,
        }
    }
}

impl VaultSettings {
    /// Builder-style setter functions for the struct

    /// Sets the target loan-to-value ratio
    pub fn target_ltv(&mut self, target_ltv: U256) -> &mut Self {
        self.target_ltv = target_ltv;
        self
    }

    /// Sets the allowed LTV drift
    pub fn allowed_drift(&mut self, allowed_drift: U256) -> &mut Self {
        self.allowed_drift = allowed_drift;
        self
    }

    /// Sets the withdrawal security fee
    pub fn security_fee_bps(&mut self, security_fee_bps: U256) -> &mut Self {
        self.security_fee_bps = security_fee_bps;
        self
    }

    /// Sets the withdrawal slippage tolerance
    pub fn withdraw_slippage_tolerance_bps(&mut self, bps: U256) -> &mut Self {
        self.withdraw_slippage_tolerance_bps = bps;
        self
    }

    /// Sets the reward swap slippage bound
    pub fn swap_slippage_bps(&mut self, swap_slippage_bps: U256) -> &mut Self {
        self.swap_slippage_bps = swap_slippage_bps;
        self
    }

    /// Sets the harvest log cadence
    pub fn harvest_log_cadence_secs(&mut self, secs: u64) -> &mut Self {
        self.harvest_log_cadence_secs = secs;
        self
    }

    /// Checks every parameter against its allowed range
    pub fn validate(&self) -> VaultResult<()> {
        if self.target_ltv >= scale() {
            return Err(VaultError::InvalidParameter(
                "Target LTV must be below 1.".to_string(),
            ));
        }
        if self.allowed_drift >= scale() {
            return Err(VaultError::InvalidParameter(
                "Allowed drift must be below 1.".to_string(),
            ));
        }
        if self.security_fee_bps > U256::from(MAX_SECURITY_FEE_BPS) {
            return Err(VaultError::InvalidParameter(format!(
                "Security fee exceeds the {MAX_SECURITY_FEE_BPS} bps ceiling."
            )));
        }
        if self.withdraw_slippage_tolerance_bps > U256::from(MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS) {
            return Err(VaultError::InvalidParameter(format!(
                "Withdraw slippage tolerance exceeds the {MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS} bps ceiling."
            )));
        }
        if self.swap_slippage_bps > U256::from(MAX_SWAP_SLIPPAGE_BPS) {
            return Err(VaultError::InvalidParameter(format!(
                "Swap slippage bound exceeds the {MAX_SWAP_SLIPPAGE_BPS} bps ceiling."
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SCALE_MINUS_ONE: u128 = crate::constants::SCALE - 1;

    #[test]
    fn setters_fill_fields() {
        let mut settings = VaultSettings::default();
        settings
            .target_ltv(U256::from(780_u64))
            .allowed_drift(U256::from(15_u64))
            .security_fee_bps(U256::from(10_u64))
            .withdraw_slippage_tolerance_bps(U256::from(50_u64))
            .swap_slippage_bps(U256::from(50_u64))
            .harvest_log_cadence_secs(600);

        assert_eq!(settings.target_ltv, U256::from(780_u64));
        assert_eq!(settings.allowed_drift, U256::from(15_u64));
        assert_eq!(settings.security_fee_bps, U256::from(10_u64));
        assert_eq!(settings.withdraw_slippage_tolerance_bps, U256::from(50_u64));
        assert_eq!(settings.swap_slippage_bps, U256::from(50_u64));
        assert_eq!(settings.harvest_log_cadence_secs, 600);
    }

    #[test]
    fn defaults_validate() {
        assert!(VaultSettings::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut settings = VaultSettings::default();
        settings.target_ltv(scale());
        assert!(matches!(
            settings.validate(),
            Err(VaultError::InvalidParameter(_))
        ));

        let mut settings = VaultSettings::default();
        settings
            .withdraw_slippage_tolerance_bps(U256::from(MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS + 1));
        assert!(matches!(
            settings.validate(),
            Err(VaultError::InvalidParameter(_))
        ));

        let mut settings = VaultSettings::default();
        settings.security_fee_bps(U256::from(MAX_SECURITY_FEE_BPS + 1));
        assert!(matches!(
            settings.validate(),
            Err(VaultError::InvalidParameter(_))
        ));
    }

    proptest! {
        #[test]
        fn in_range_parameters_validate(
            target in 0_u128..SCALE_MINUS_ONE,
            fee in 0_u128..=MAX_SECURITY_FEE_BPS,
            tolerance in 0_u128..=MAX_WITHDRAW_SLIPPAGE_TOLERANCE_BPS,
        ) {
            let mut settings = VaultSettings::default();
            settings
                .target_ltv(U256::from(target))
                .security_fee_bps(U256::from(fee))
                .withdraw_slippage_tolerance_bps(U256::from(tolerance));
            prop_assert!(settings.validate().is_ok());
        }
    }
}
