// crates/pylon-core/src/crypto.rs

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::PylonError;

/// An ed25519 keypair. The verifying key bytes double as the account's
/// [`Address`], so a signature verifies against an address directly.
#[derive(Clone)]
pub struct Keypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl Keypair {
    /// Generate a new random ed25519 keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Build a keypair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Deterministic keypair for a human-readable label.
    ///
    /// The seed is `sha256("pylon:" || label)`. Scenario files and tests use
    /// this to name accounts that must also be able to sign.
    pub fn from_label(label: &str) -> Self {
        let seed = hash_parts(&[b"pylon:", label.as_bytes()]);
        Self::from_seed(&seed)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Keypair {
            signing_key,
            verifying_key,
        }
    }

    /// The address controlled by this keypair.
    pub fn address(&self) -> Address {
        Address(self.verifying_key.to_bytes())
    }

    /// Sign a message and return the 64 signature bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature = self.signing_key.sign(message);
        signature.to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Verify an ed25519 signature made by the key behind `signer`.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify and
/// an error when the address is not a valid curve point or the signature is
/// not 64 bytes.
pub fn verify_signature(
    signer: &Address,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool, PylonError> {
    let verifying_key = VerifyingKey::from_bytes(&signer.0)
        .map_err(|e| PylonError::Crypto(format!("Invalid public key: {}", e)))?;

    let signature_array: [u8; 64] = signature_bytes
        .try_into()
        .map_err(|_| PylonError::Crypto("Signature must be exactly 64 bytes".to_string()))?;

    let signature = ed25519_dalek::Signature::from_bytes(&signature_array);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Compute SHA-256 hash of the given bytes.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    hash_parts(&[data])
}

/// SHA-256 over the concatenation of `parts`.
pub fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
