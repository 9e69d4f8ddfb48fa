//! Signer recovery for EIP-191 personal messages.
//!
//! Given the exact message text and a 65-byte `r || s || v` secp256k1
//! signature, recovers the address of the key that produced it. A valid
//! signature over a different message (or by a different key) recovers a
//! different, perfectly well-formed address; deciding that it does not
//! match is the caller's job.

use crate::auth::address::{WalletAddress, ADDRESS_LEN};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Length of a recoverable signature: r (32) + s (32) + v (1).
pub const SIGNATURE_LEN: usize = 65;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("Malformed signature: {0}")]
    Malformed(String),
}

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// EIP-191 personal-message hash:
/// `keccak256("\x19Ethereum Signed Message:\n" + byte length + message)`.
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Derive the account address of a public key: the last 20 bytes of the
/// Keccak-256 of its uncompressed encoding without the `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> WalletAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    WalletAddress::from_bytes(&bytes)
}

/// Recover the signer of `message` from a 65-byte signature.
///
/// `v` may be given as 0/1 or in the legacy 27/28 form. High-`s`
/// signatures are normalized to their low-`s` twin (flipping the y parity)
/// before recovery.
pub fn recover_address(message: &str, signature: &[u8]) -> Result<WalletAddress, RecoveryError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(RecoveryError::Malformed(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LEN,
            signature.len()
        )));
    }

    let v = signature[64];
    let parity = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => {
            return Err(RecoveryError::Malformed(format!(
                "invalid recovery id {}",
                other
            )))
        }
    };

    let signature = Signature::from_slice(&signature[..64])
        .map_err(|e| RecoveryError::Malformed(format!("invalid r/s: {}", e)))?;
    let recovery_id = RecoveryId::new(parity == 1, false);

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low_s) => (low_s, RecoveryId::new(!recovery_id.is_y_odd(), false)),
        None => (signature, recovery_id),
    };

    let prehash = hash_personal_message(message.as_bytes());
    let key = VerifyingKey::recover_from_prehash(&prehash, &signature, recovery_id)
        .map_err(|e| RecoveryError::Malformed(format!("public key recovery failed: {}", e)))?;

    Ok(address_of(&key))
}
