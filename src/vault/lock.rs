//! Reentrancy guard for capital-affecting operations.
//!
//! The execution model is single-threaded and transactional; the only
//! interleaving hazard is a collaborator calling back into the vault
//! while an operation is in flight. The lock turns any such nested
//! invocation into an explicit `Locked` error.

use crate::error::{VaultError, VaultResult};

#[derive(Clone, Debug, Default)]
pub struct Lock {
    is_locked: bool,
}

impl Lock {
    /// Attempts to acquire the lock.
    ///
    /// # Returns
    /// * `Ok(())` - Lock successfully acquired
    /// * `Err(VaultError::Locked)` - An operation is already in flight
    pub fn try_lock(&mut self) -> VaultResult<()> {
        if self.is_locked {
            return Err(VaultError::Locked);
        }
        self.is_locked = true;
        Ok(())
    }

    /// Releases the lock to allow the next operation
    pub fn unlock(&mut self) {
        self.is_locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }
}
