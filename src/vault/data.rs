//! Mutable vault data

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{harvest::HarvestLog, safety::SafetyState};

/// Struct containing all mutable data the vault carries between operations
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VaultData {
    /// Idle base asset held by the vault itself
    pub vault_idle: U256,
    /// Idle base asset held by the strategy, not yet supplied
    pub strategy_idle: U256,
    /// Current safety state
    pub safety: SafetyState,
    /// Rolling window of harvest observations
    pub harvest_log: HarvestLog,
}

impl VaultData {
    /// Sets the vault-side idle balance
    pub fn vault_idle(&mut self, vault_idle: U256) -> &mut Self {
        self.vault_idle = vault_idle;
        self
    }

    /// Sets the strategy-side idle balance
    pub fn strategy_idle(&mut self, strategy_idle: U256) -> &mut Self {
        self.strategy_idle = strategy_idle;
        self
    }

    /// Sets the safety state
    pub fn safety(&mut self, safety: SafetyState) -> &mut Self {
        self.safety = safety;
        self
    }
}
