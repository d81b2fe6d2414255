//! Venue ledger actions and their EIP-712 signing payloads.
//!
//! Withdrawals and intra-venue transfers never touch an external chain:
//! the connected wallet signs typed data with `eth_signTypedData_v4` and the
//! signed action goes to the venue ledger.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::NetworkMode;

const DOMAIN_NAME: &str = "VenueSignTransaction";
const DOMAIN_VERSION: &str = "1";
const VERIFYING_CONTRACT: &str = "0x0000000000000000000000000000000000000000";

/// An action on the venue's internal ledger. Amounts are decimal strings
/// in the asset's display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerAction {
    /// Settlement-asset withdrawal to `destination` on the settlement chain.
    Withdraw { destination: String, amount: String },
    /// Spot token send; bridged withdrawals send to a guardian-verified
    /// address.
    #[serde(rename_all = "camelCase")]
    SpotSend {
        destination: String,
        token: String,
        amount: String,
    },
    /// Moves the settlement asset between the perp and spot sub-ledgers.
    #[serde(rename_all = "camelCase")]
    ClassTransfer { amount: String, to_perp: bool },
}

impl LedgerAction {
    pub fn primary_type(&self) -> &'static str {
        match self {
            LedgerAction::Withdraw { .. } => "VenueTransaction:Withdraw",
            LedgerAction::SpotSend { .. } => "VenueTransaction:SpotSend",
            LedgerAction::ClassTransfer { .. } => "VenueTransaction:ClassTransfer",
        }
    }

    /// The full `eth_signTypedData_v4` document for this action.
    pub fn typed_data(&self, nonce: u64, mode: NetworkMode, signing_chain_id: u64) -> Value {
        let venue_chain = venue_chain(mode);
        let (fields, message) = match self {
            LedgerAction::Withdraw { destination, amount } => (
                json!([
                    { "name": "venueChain", "type": "string" },
                    { "name": "destination", "type": "string" },
                    { "name": "amount", "type": "string" },
                    { "name": "time", "type": "uint64" },
                ]),
                json!({
                    "venueChain": venue_chain,
                    "destination": destination,
                    "amount": amount,
                    "time": nonce,
                }),
            ),
            LedgerAction::SpotSend {
                destination,
                token,
                amount,
            } => (
                json!([
                    { "name": "venueChain", "type": "string" },
                    { "name": "destination", "type": "string" },
                    { "name": "token", "type": "string" },
                    { "name": "amount", "type": "string" },
                    { "name": "time", "type": "uint64" },
                ]),
                json!({
                    "venueChain": venue_chain,
                    "destination": destination,
                    "token": token,
                    "amount": amount,
                    "time": nonce,
                }),
            ),
            LedgerAction::ClassTransfer { amount, to_perp } => (
                json!([
                    { "name": "venueChain", "type": "string" },
                    { "name": "amount", "type": "string" },
                    { "name": "toPerp", "type": "bool" },
                    { "name": "nonce", "type": "uint64" },
                ]),
                json!({
                    "venueChain": venue_chain,
                    "amount": amount,
                    "toPerp": to_perp,
                    "nonce": nonce,
                }),
            ),
        };

        json!({
            "domain": {
                "name": DOMAIN_NAME,
                "version": DOMAIN_VERSION,
                "chainId": signing_chain_id,
                "verifyingContract": VERIFYING_CONTRACT,
            },
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                self.primary_type(): fields,
            },
            "primaryType": self.primary_type(),
            "message": message,
        })
    }
}

fn venue_chain(mode: NetworkMode) -> &'static str {
    match mode {
        NetworkMode::Mainnet => "Mainnet",
        NetworkMode::Testnet => "Testnet",
    }
}

/// An action together with the wallet's signature over its typed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAction {
    pub action: LedgerAction,
    pub nonce: u64,
    /// `0x`-prefixed 65-byte `r || s || v`.
    pub signature: String,
    pub venue_chain: String,
}

impl SignedAction {
    pub fn new(action: LedgerAction, nonce: u64, signature: &[u8], mode: NetworkMode) -> Self {
        Self {
            action,
            nonce,
            signature: format!("0x{}", hex::encode(signature)),
            venue_chain: venue_chain(mode).to_string(),
        }
    }
}
