use thiserror::Error;

/// Guardian table and per-guardian signature errors.
///
/// Signature errors never escape `verify`; they are rendered into
/// `VerificationResult::errors`.
#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("invalid public key for guardian {node_id}: {reason}")]
    InvalidPublicKey { node_id: String, reason: String },

    #[error("duplicate guardian: {0}")]
    DuplicateGuardian(String),

    #[error("guardian set has {count} nodes, expected {expected}")]
    WrongGuardianCount { count: usize, expected: usize },

    #[error("missing signature")]
    MissingSignature,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature must be 64 bytes, got {0}")]
    SignatureLength(usize),
}
