// crates/pylon-core/src/address.rs

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::Keypair;
use crate::error::PylonError;

/// A 32-byte account identity.
///
/// User accounts are ed25519 verifying keys, so signed approvals can be
/// checked against the address itself. Contract-like components (treasury,
/// pools, vaults) and tokens use the same type.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never owns anything and can never sign.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Address of the deterministic keypair for `label`.
    pub fn from_label(label: &str) -> Self {
        Keypair::from_label(label).address()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = PylonError;

    /// Parses `0x` + 64 hex digits. Any other string is treated as a label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("0x") {
            Some(digits) if digits.len() == 64 => {
                let bytes = hex::decode(digits)
                    .map_err(|e| PylonError::Serialization(format!("Invalid address hex: {}", e)))?;
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                Ok(Address(out))
            }
            _ => Ok(Address::from_label(s)),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form for logs: 0x + first 4 bytes.
        write!(f, "0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let addr = Address::from_label("treasury");
        let parsed: Address = addr.to_hex().parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_label_parse() {
        let parsed: Address = "alice".parse().unwrap();
        assert_eq!(parsed, Address::from_label("alice"));
    }

    #[test]
    fn test_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn test_json_uses_hex() {
        let addr = Address::from_label("dao");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
