use serde::{Deserialize, Serialize};

/// The fields a guardian attests to for one generated address.
///
/// Built for a single generate-then-verify round trip and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// Where the bridged funds finally land.
    pub destination_address: String,
    /// Chain name of the destination (`hyperliquid`, `ethereum`, `solana`).
    pub destination_chain: String,
    /// Asset identifier as the address service knows it (`eth`, `sol`).
    pub asset: String,
    /// The candidate address returned by the address service.
    pub address: String,
}

impl Proposal {
    pub fn new(
        destination_address: impl Into<String>,
        destination_chain: impl Into<String>,
        asset: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            destination_address: destination_address.into(),
            destination_chain: destination_chain.into(),
            asset: asset.into(),
            address: address.into(),
        }
    }

    /// The coin-type tag guardians sign: the native chain of the asset.
    /// Unknown assets sign under their own identifier.
    pub fn coin_type(&self) -> &str {
        match self.asset.as_str() {
            "eth" => "ethereum",
            "sol" => "solana",
            "btc" => "bitcoin",
            other => other,
        }
    }

    /// The exact bytes `node_id` is expected to have signed.
    pub fn canonical_message(&self, node_id: &str) -> String {
        format!(
            "{}:user-{}-{}-{}-{}",
            node_id,
            self.coin_type(),
            self.destination_chain,
            self.destination_address,
            self.address
        )
    }
}
