//! Guardian threshold verification for bridge addresses.
//!
//! An address returned by the address-generation service is only trusted
//! once a quorum of independent guardian nodes has signed it. Each guardian
//! signs `"<nodeId>:user-<coinType>-<destinationChain>-<destinationAddress>-<address>"`
//! with ECDSA P-256 over SHA-256; signatures travel as base64 of raw `r || s`.

pub mod error;
pub mod guardians;
pub mod proposal;
pub mod verifier;

pub use error::GuardianError;
pub use guardians::{GuardianKey, GuardianSet};
pub use proposal::Proposal;
pub use verifier::{verify, GuardianVerifier, VerificationResult};

/// Valid signatures required before an address is trusted.
pub const THRESHOLD: usize = 2;

/// Guardians per network mode.
pub const GUARDIAN_COUNT: usize = 3;
