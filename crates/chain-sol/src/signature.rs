//! Verification of wallet `signMessage` output.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::address::address_to_bytes;
use crate::error::SolError;

/// Verifies a 64-byte Ed25519 signature over the raw `message` bytes against
/// the public key encoded by `address`.
pub fn verify_message(address: &str, message: &[u8], signature: &[u8]) -> Result<bool, SolError> {
    let pubkey = address_to_bytes(address)?;
    let key = VerifyingKey::from_bytes(&pubkey)
        .map_err(|e| SolError::InvalidAddress(format!("not an ed25519 key: {e}")))?;

    let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
        SolError::InvalidSignature(format!("expected 64 bytes, got {}", signature.len()))
    })?;
    let sig = Signature::from_bytes(&sig_bytes);

    Ok(key.verify(message, &sig).is_ok())
}
