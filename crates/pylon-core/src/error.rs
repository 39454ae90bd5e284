// crates/pylon-core/src/error.rs

use thiserror::Error;

/// Protocol-wide error types for the Pylon protocol.
///
/// Every variant aborts the transaction that raised it; the engine restores
/// the pre-transaction state. The display strings are the reason codes
/// surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PylonError {
    /// Caller lacks the role the operation requires.
    #[error("Unauthorized")]
    Unauthorized,

    /// An account or contract holds fewer tokens than the operation moves.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    /// The bond's treasury allowance cannot cover the requested payout.
    #[error("Sold out: requested {requested}, allowance {allowance}")]
    AllowanceExceeded { requested: u128, allowance: u128 },

    /// Spot price of the payout token is below the bond's floor.
    #[error("Price too low for bond minting")]
    PriceTooLow { price: u128, min_price: u128 },

    /// Requested bond exceeds the allowance-derived cap.
    #[error("Bond too big: requested {requested}, max {max}")]
    BondTooBig { requested: u128, max: u128 },

    /// Computed payout fell below the caller's minimum.
    #[error("Slippage minReward: payout {payout}, min {min_payout}")]
    SlippageMinReward { payout: u128, min_payout: u128 },

    /// Same-block deposit by an untrusted origin.
    #[error("Flash Protection")]
    FlashProtection,

    /// Withdrawal larger than the staked balance.
    #[error("Withdraw overflow")]
    WithdrawOverflow,

    /// Vault shares are still inside their lock window.
    #[error("Tokens locked until {unlock_time}")]
    TokensLocked { unlock_time: u64 },

    /// Signed approval presented after its deadline.
    #[error("Permit expired")]
    PermitExpired,

    /// Signed approval does not verify for the claimed owner and nonce.
    #[error("Permit invalid signature")]
    PermitInvalidSignature,

    /// Faucet cadence or exhaustion gate rejected the drip.
    #[error("Cannot drip now")]
    CannotDripNow,

    /// Spender allowance is smaller than the amount moved on its behalf.
    #[error("Insufficient allowance: requested {requested}, allowance {allowance}")]
    InsufficientAllowance { requested: u128, allowance: u128 },

    /// Token transfer primitive reported failure.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Checked arithmetic overflowed or underflowed.
    #[error("Arithmetic overflow")]
    Overflow,

    /// Invalid state transition or argument.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cryptographic error (key parsing, signature encoding).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for PylonError {
    fn from(e: serde_json::Error) -> Self {
        PylonError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for PylonError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        PylonError::Crypto(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_strings() {
        assert_eq!(PylonError::Unauthorized.to_string(), "Unauthorized");
        assert_eq!(PylonError::FlashProtection.to_string(), "Flash Protection");
        assert_eq!(PylonError::WithdrawOverflow.to_string(), "Withdraw overflow");
        assert_eq!(
            PylonError::PriceTooLow { price: 1, min_price: 2 }.to_string(),
            "Price too low for bond minting"
        );
        assert!(PylonError::AllowanceExceeded { requested: 2, allowance: 1 }
            .to_string()
            .starts_with("Sold out"));
    }
}
