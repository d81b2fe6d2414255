//! Solana chain support for the bridge.
//!
//! Address handling, the unsigned wire format for a native SOL transfer
//! (handed to the wallet's `signAndSendTransaction`), and verification of
//! `signMessage` output. Built on `ed25519-dalek` and `bs58` only.

pub mod address;
pub mod error;
pub mod signature;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, validate_address};
pub use error::SolError;
pub use signature::verify_message;
pub use transaction::{
    build_sol_transfer, compile_transaction, decode_compact_u16, encode_compact_u16,
    serialize_message, serialize_unsigned, CompiledInstruction, SolAccountMeta, SolInstruction,
    SolTransaction, SYSTEM_PROGRAM_ID,
};

/// Chain identifier the bridge uses for Solana (SLIP-44 coin type).
pub const SOLANA_CHAIN_ID: &str = "501";

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Native SOL decimals.
pub const SOL_DECIMALS: u8 = 9;

/// Solscan link for a transaction signature.
pub fn tx_url(signature: &str, is_testnet: bool) -> String {
    if is_testnet {
        format!("https://solscan.io/tx/{signature}?cluster=devnet")
    } else {
        format!("https://solscan.io/tx/{signature}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_links() {
        assert_eq!(tx_url("5abc", false), "https://solscan.io/tx/5abc");
        assert_eq!(
            tx_url("5abc", true),
            "https://solscan.io/tx/5abc?cluster=devnet"
        );
    }
}
