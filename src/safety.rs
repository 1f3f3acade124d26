//! Safety states gating deposits and leverage.

use serde::{Deserialize, Serialize};

/// Operational state of the vault
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyState {
    /// Functioning as expected
    #[default]
    Active,
    /// New deposits and leverage steps are blocked; idle funds can still
    /// be withdrawn
    Paused,
    /// The whole position was force-closed into idle asset. Terminal
    /// until an operator explicitly re-activates.
    PanickedUnwound,
}

impl SafetyState {
    /// `true` while new deposits are accepted
    pub fn accepts_deposits(&self) -> bool {
        matches!(self, SafetyState::Active)
    }

    /// `true` while lever/delever steps and harvest reinvestment may run
    pub fn allows_leverage(&self) -> bool {
        matches!(self, SafetyState::Active)
    }
}
