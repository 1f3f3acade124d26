//! Durable vault snapshot.
//!
//! Everything that must survive across operations lives here: ledger
//! balances, total units, settings, safety state and the harvest window.
//! The executable vault is reconstructed from a snapshot with fresh
//! collaborators and an unlocked guard.

use serde::{Deserialize, Serialize};

use crate::ledger::ShareLedger;

use super::{data::VaultData, settings::VaultSettings};

/// Persisted vault state
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StableVault {
    /// Claim-unit balances and total supply
    pub ledger: ShareLedger,
    /// Operator parameters
    pub settings: VaultSettings,
    /// Idle balances, safety state and harvest log
    pub data: VaultData,
}
