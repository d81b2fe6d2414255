use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Mainnet,
    Testnet,
}

impl NetworkMode {
    pub fn is_mainnet(self) -> bool {
        self == NetworkMode::Mainnet
    }
}

/// Runtime settings for the transfer flows.
///
/// Guardian and token tables are compiled in per [`NetworkMode`]; only the
/// endpoints and the settlement bridge address come from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub mode: NetworkMode,
    /// Fixed bridge contract that receives the settlement asset directly.
    pub bridge_contract_address: String,
    /// Base URL of the address-generation and fee service.
    pub address_service_url: String,
    pub solana_rpc_url: String,
    /// Chain name the venue is known by in bridge proposals.
    pub venue_chain_name: String,
    /// Chain id placed in the venue's typed-data signing domain.
    pub signing_chain_id: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl BridgeConfig {
    pub fn mainnet() -> Self {
        Self {
            mode: NetworkMode::Mainnet,
            bridge_contract_address: "0x2df1c51e09aecf9cacb7bc98cb1742757f163df7".into(),
            address_service_url: "https://api.hyperunit.xyz".into(),
            solana_rpc_url: "https://api.mainnet-beta.solana.com".into(),
            venue_chain_name: "hyperliquid".into(),
            signing_chain_id: chain_eth::chains::ARBITRUM.chain_id,
            receipt_poll_interval_ms: 2_000,
        }
    }

    pub fn testnet() -> Self {
        Self {
            mode: NetworkMode::Testnet,
            bridge_contract_address: "0x08cfc1b6b2dcf36a1480b99353a354aa8ac56f89".into(),
            address_service_url: "https://api.hyperunit-testnet.xyz".into(),
            solana_rpc_url: "https://api.devnet.solana.com".into(),
            venue_chain_name: "hyperliquid".into(),
            signing_chain_id: chain_eth::chains::ARBITRUM_SEPOLIA.chain_id,
            receipt_poll_interval_ms: 2_000,
        }
    }

    pub fn for_mode(mode: NetworkMode) -> Self {
        match mode {
            NetworkMode::Mainnet => Self::mainnet(),
            NetworkMode::Testnet => Self::testnet(),
        }
    }

    /// Parses a JSON document. Fields left out take the defaults of the
    /// document's `mode` (mainnet when `mode` is absent too).
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let overrides: serde_json::Value =
            serde_json::from_str(json).map_err(|e| BridgeError::Config(e.to_string()))?;
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(BridgeError::Config("expected a JSON object".into()));
        };

        let mode = match overrides.get("mode") {
            Some(m) => serde_json::from_value(m.clone())
                .map_err(|e| BridgeError::Config(format!("mode: {e}")))?,
            None => NetworkMode::Mainnet,
        };

        let mut merged = serde_json::to_value(Self::for_mode(mode))
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        if let serde_json::Value::Object(base) = &mut merged {
            base.extend(overrides);
        }

        let config: Self =
            serde_json::from_value(merged).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if !chain_eth::address::validate_address(&self.bridge_contract_address).unwrap_or(false) {
            return Err(BridgeError::Config(format!(
                "bridge_contract_address {} is not a valid address",
                self.bridge_contract_address
            )));
        }
        for (name, url) in [
            ("address_service_url", &self.address_service_url),
            ("solana_rpc_url", &self.solana_rpc_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(BridgeError::Config(format!("{name} must be an http(s) URL")));
            }
        }
        if self.venue_chain_name.is_empty() {
            return Err(BridgeError::Config("venue_chain_name is empty".into()));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(BridgeError::Config("receipt_poll_interval_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn is_mainnet(&self) -> bool {
        self.mode.is_mainnet()
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
