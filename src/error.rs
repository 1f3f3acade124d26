use serde::{Deserialize, Serialize};

/// Leveraged Vault Result
pub type VaultResult<T> = Result<T, VaultError>;

/// Leveraged Vault Errors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VaultError {
    /// Caller tried to burn more units than it holds
    InsufficientBalance,
    /// Deposits (or leverage steps) are blocked by the safety state
    VaultPaused,
    /// The strategy could not free the requested liquidity
    UnwindShortfall,
    /// A conversion step returned less value than the configured tolerance allows
    SlippageExceeded,
    /// The market cannot absorb the requested lever/delever step
    MarketLiquidityInsufficient,
    /// Fewer harvest records than requested
    InsufficientHistory,
    /// Unauthorized access
    Unauthorized,
    /// A capital-affecting operation is already in flight
    Locked,
    /// A parameter is out of its allowed range
    InvalidParameter(String),
    /// Arithmetic error
    Arithmetic(String),
    /// Failure reported by an external collaborator
    Market(String),
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> VaultError {
    VaultError::Arithmetic(s.as_ref().to_string())
}
