//! Share ledger: claim-unit balances and asset/unit conversion math.
//!
//! The ledger owns unit balances exclusively. Pricing is always derived
//! from a managed balance measured by the caller *before* new capital is
//! absorbed, so a depositor can never dilute themselves or anyone else.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::scale,
    error::{arithmetic_err, VaultError, VaultResult},
};

/// Holder-to-units map plus the total unit supply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: HashMap<Address, U256>,
    total_units: U256,
}

impl ShareLedger {
    pub fn total_units(&self) -> U256 {
        self.total_units
    }

    pub fn balance_of(&self, holder: Address) -> U256 {
        self.balances.get(&holder).copied().unwrap_or(U256::ZERO)
    }

    /// `true` iff no units are outstanding
    pub fn is_empty(&self) -> bool {
        self.total_units.is_zero()
    }

    /// Units to mint for a deposit of `amount`, priced against the managed
    /// balance measured before the deposit is absorbed. Bootstraps 1:1.
    pub fn units_for_deposit(&self, amount: U256, managed_before: U256) -> VaultResult<U256> {
        if self.total_units.is_zero() {
            return Ok(amount);
        }
        amount
            .saturating_mul(self.total_units)
            .checked_div(managed_before)
            .ok_or_else(|| arithmetic_err("Managed balance was zero with units outstanding."))
    }

    /// Gross asset value of `units` at the current managed balance
    pub fn asset_for_units(&self, units: U256, managed: U256) -> VaultResult<U256> {
        units
            .saturating_mul(managed)
            .checked_div(self.total_units)
            .ok_or_else(|| arithmetic_err("No units outstanding."))
    }

    /// Price of one full (e18) unit in asset terms. A fixed 1.0 while the
    /// vault is empty.
    pub fn price_per_full_share(&self, managed: U256) -> VaultResult<U256> {
        if self.total_units.is_zero() {
            return Ok(scale());
        }
        managed
            .saturating_mul(scale())
            .checked_div(self.total_units)
            .ok_or_else(|| arithmetic_err("No units outstanding."))
    }

    /// Credits `units` to `holder`
    pub fn mint(&mut self, holder: Address, units: U256) -> VaultResult<()> {
        if units.is_zero() {
            return Err(VaultError::InvalidParameter(
                "Cannot mint zero units.".to_string(),
            ));
        }
        let balance = self.balances.entry(holder).or_insert(U256::ZERO);
        *balance = balance.saturating_add(units);
        self.total_units = self.total_units.saturating_add(units);
        Ok(())
    }

    /// Debits `units` from `holder`, failing when the balance is short
    pub fn burn(&mut self, holder: Address, units: U256) -> VaultResult<()> {
        let balance = self.balance_of(holder);
        if units > balance {
            return Err(VaultError::InsufficientBalance);
        }
        let remaining = balance - units;
        if remaining.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, remaining);
        }
        self.total_units = self.total_units.saturating_sub(units);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn holder(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn bootstrap_mints_one_to_one() {
        let ledger = ShareLedger::default();
        let amount = U256::from(1_000_000_u64);
        assert_eq!(
            ledger.units_for_deposit(amount, U256::ZERO).unwrap(),
            amount
        );
    }

    #[test]
    fn proportional_mint_after_appreciation() {
        let mut ledger = ShareLedger::default();
        ledger.mint(holder(0x11), U256::from(100_u64)).unwrap();
        // Managed balance doubled since the first deposit, so a 50-asset
        // deposit is worth 25 units.
        let units = ledger
            .units_for_deposit(U256::from(50_u64), U256::from(200_u64))
            .unwrap();
        assert_eq!(units, U256::from(25_u64));
    }

    #[test]
    fn burn_rejects_over_balance() {
        let mut ledger = ShareLedger::default();
        ledger.mint(holder(0x11), U256::from(10_u64)).unwrap();
        let result = ledger.burn(holder(0x11), U256::from(11_u64));
        assert_eq!(result, Err(VaultError::InsufficientBalance));
        assert_eq!(ledger.balance_of(holder(0x11)), U256::from(10_u64));
    }

    #[test]
    fn burn_to_zero_clears_holder() {
        let mut ledger = ShareLedger::default();
        ledger.mint(holder(0x22), U256::from(5_u64)).unwrap();
        ledger.burn(holder(0x22), U256::from(5_u64)).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.balance_of(holder(0x22)), U256::ZERO);
    }

    #[test]
    fn empty_vault_price_is_unit() {
        let ledger = ShareLedger::default();
        assert_eq!(
            ledger.price_per_full_share(U256::ZERO).unwrap(),
            scale()
        );
    }

    #[test]
    fn asset_for_units_is_pro_rata() {
        let mut ledger = ShareLedger::default();
        ledger.mint(holder(0x11), U256::from(300_u64)).unwrap();
        ledger.mint(holder(0x22), U256::from(100_u64)).unwrap();
        let amount = ledger
            .asset_for_units(U256::from(100_u64), U256::from(800_u64))
            .unwrap();
        assert_eq!(amount, U256::from(200_u64));
    }

    proptest! {
        #[test]
        fn total_units_tracks_balances(
            amounts in proptest::collection::vec(1_u128..1_000_000_000_000, 1..20),
        ) {
            let mut ledger = ShareLedger::default();
            for (i, amount) in amounts.iter().enumerate() {
                ledger.mint(holder(i as u8), U256::from(*amount)).unwrap();
            }
            let sum = amounts.iter().map(|a| U256::from(*a)).fold(U256::ZERO, |acc, a| acc + a);
            prop_assert_eq!(ledger.total_units(), sum);
        }

        #[test]
        fn share_price_never_decreases_on_deposit(
            first in 1_u128..1_000_000_000_000,
            second in 1_u128..1_000_000_000_000,
            gain in 0_u128..1_000_000_000_000,
        ) {
            let mut ledger = ShareLedger::default();
            let first = U256::from(first);
            ledger.mint(holder(0x11), ledger.units_for_deposit(first, U256::ZERO).unwrap()).unwrap();

            // Externally-driven appreciation between the two deposits
            let managed_before = first + U256::from(gain);
            let pps_before = ledger.price_per_full_share(managed_before).unwrap();

            let second = U256::from(second);
            let units = ledger.units_for_deposit(second, managed_before).unwrap();
            if !units.is_zero() {
                ledger.mint(holder(0x22), units).unwrap();
            }
            let pps_after = ledger.price_per_full_share(managed_before + second).unwrap();
            // Flooring on the minted units can only push the price up
            prop_assert!(pps_after >= pps_before);
        }
    }
}
