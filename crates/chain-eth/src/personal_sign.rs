//! EIP-191 `personal_sign` verification.
//!
//! Wallets sign `keccak256("\x19Ethereum Signed Message:\n" || len || message)`
//! and return `r || s || v` with `v` in `{27, 28}` (some return `{0, 1}`).

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::address::{addresses_equal, pubkey_to_address};
use crate::error::EthError;

/// The 32-byte digest a wallet signs for `personal_sign(message)`.
pub fn personal_sign_digest(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Recovers the checksummed address that produced a `personal_sign` signature.
pub fn recover_signer(message: &[u8], signature: &[u8]) -> Result<String, EthError> {
    if signature.len() != 65 {
        return Err(EthError::InvalidSignature(format!(
            "expected 65 bytes, got {}",
            signature.len()
        )));
    }

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
    let v = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        other => {
            return Err(EthError::InvalidSignature(format!("bad recovery byte {other}")));
        }
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| EthError::InvalidSignature(format!("bad recovery byte {v}")))?;

    let digest = personal_sign_digest(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|e| EthError::InvalidSignature(e.to_string()))?;

    pubkey_to_address(key.to_encoded_point(false).as_bytes())
}

/// True when `signature` over `message` was produced by `expected_address`.
pub fn verify_signer(
    message: &[u8],
    signature: &[u8],
    expected_address: &str,
) -> Result<bool, EthError> {
    let recovered = recover_signer(message, signature)?;
    Ok(addresses_equal(&recovered, expected_address))
}
