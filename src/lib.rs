//! Leveraged single-asset yield vault.
//!
//! Depositors hand the vault a base asset and receive claim units priced
//! by a monotone share ledger. The vault folds the pooled asset into a
//! looped supply/borrow position on a lending market, holds the position
//! inside a drift band around an operator-set target LTV, and compounds
//! claimed rewards back into the position on every harvest. A safety
//! controller can pause new inflows or force-unwind the whole position
//! into idle asset.
//!
//! The lending market, the reward swap path, the fee sink and the
//! permission gate are consumed through the traits in [`market`];
//! [`vault::ExecutableVault`] wires them together and sequences every
//! public operation atomically under a reentrancy lock.

pub mod constants;
pub mod error;
pub mod harvest;
pub mod journal;
pub mod ledger;
pub mod leverage;
pub mod market;
pub mod position;
pub mod safety;
pub mod vault;

#[cfg(test)]
mod testing;

pub use error::{VaultError, VaultResult};
pub use vault::{ExecutableVault, StableVault, VaultSettings};
