//! Collaborators the orchestrator talks to but does not implement: the
//! address-generation service, the venue ledger and a Solana RPC node.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::ledger::SignedAction;
use crate::tokens::SubLedger;

/// Route key for one generated address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub source_chain: String,
    pub destination_chain: String,
    pub asset: String,
    pub destination_address: String,
}

/// `{ address, signatures }` as returned by the address service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratedAddress {
    pub address: String,
    #[serde(default)]
    pub signatures: HashMap<String, String>,
}

/// Fee entries keyed by chain name, passed through as the service sends them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FeeEstimate(pub BTreeMap<String, serde_json::Value>);

impl FeeEstimate {
    pub fn for_chain(&self, chain: &str) -> Option<&serde_json::Value> {
        self.0.get(chain)
    }
}

#[async_trait]
pub trait AddressService: Send + Sync {
    async fn generate_address(&self, request: &AddressRequest) -> Result<GeneratedAddress, BridgeError>;

    async fn estimate_fees(&self) -> Result<FeeEstimate, BridgeError>;
}

/// One asset balance on a venue sub-ledger, as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerBalance {
    pub asset: String,
    pub available: String,
}

/// The venue's response to a submitted action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerReceipt {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

#[async_trait]
pub trait VenueLedger: Send + Sync {
    async fn balances(&self, user: &str, ledger: SubLedger) -> Result<Vec<LedgerBalance>, BridgeError>;

    async fn next_nonce(&self, user: &str) -> Result<u64, BridgeError>;

    async fn submit_action(&self, action: &SignedAction) -> Result<LedgerReceipt, BridgeError>;
}

/// Confirmation level of a Solana transaction signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Processed,
    Confirmed,
    Finalized,
    Failed(String),
}

#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Balance in lamports.
    async fn get_balance(&self, address: &str) -> Result<u64, BridgeError>;

    async fn latest_blockhash(&self) -> Result<[u8; 32], BridgeError>;

    /// `None` while the cluster has not seen the signature yet.
    async fn signature_status(&self, signature: &str) -> Result<Option<SignatureStatus>, BridgeError>;
}
