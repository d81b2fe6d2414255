//! Ethereum/EVM chain support for the bridge.
//!
//! This crate provides:
//! - The EVM networks the bridge recognises (hex chain IDs, explorers)
//! - EIP-55 address validation and case-insensitive comparison
//! - ERC-20 interaction encoding (transfer, balanceOf)
//! - Unsigned `eth_sendTransaction` requests for wallet submission
//! - EIP-191 `personal_sign` signer recovery
//!
//! Nothing here signs: every signature is produced by the user's wallet.

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod personal_sign;
pub mod transaction;

pub use alloy_primitives::U256;
pub use error::EthError;
