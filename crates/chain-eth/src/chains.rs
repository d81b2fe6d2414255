use serde::Serialize;

use crate::error::EthError;

/// Definition of an EVM-compatible network a bridge token can live on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvmChain {
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub explorer_url: &'static str,
    pub is_testnet: bool,
}

impl EvmChain {
    /// The chain id in the `0x`-prefixed lowercase hex form wallets report
    /// from `eth_chainId` and expect in `wallet_switchEthereumChain`.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Explorer link for a transaction hash on this chain.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Ethereum Mainnet (chain ID 0x1).
pub const ETHEREUM: EvmChain = EvmChain {
    chain_id: 1,
    name: "Ethereum",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://etherscan.io",
    is_testnet: false,
};

/// Sepolia Testnet (chain ID 0xaa36a7).
pub const SEPOLIA: EvmChain = EvmChain {
    chain_id: 11155111,
    name: "Sepolia",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://sepolia.etherscan.io",
    is_testnet: true,
};

/// Arbitrum One (chain ID 0xa4b1).
pub const ARBITRUM: EvmChain = EvmChain {
    chain_id: 42161,
    name: "Arbitrum One",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://arbiscan.io",
    is_testnet: false,
};

/// Arbitrum Sepolia (chain ID 0x66eee).
pub const ARBITRUM_SEPOLIA: EvmChain = EvmChain {
    chain_id: 421614,
    name: "Arbitrum Sepolia",
    symbol: "ETH",
    decimals: 18,
    explorer_url: "https://sepolia.arbiscan.io",
    is_testnet: true,
};

const ALL_CHAINS: &[&EvmChain] = &[&ETHEREUM, &SEPOLIA, &ARBITRUM, &ARBITRUM_SEPOLIA];

/// Returns the chain definition for a numeric chain ID, or `None` if unsupported.
pub fn get_chain(chain_id: u64) -> Option<&'static EvmChain> {
    ALL_CHAINS.iter().find(|c| c.chain_id == chain_id).copied()
}

/// Looks a chain up by the hex id a wallet reports. Accepts either case and
/// leading zeros (`0x0001` and `0x1` are the same chain).
pub fn get_chain_by_hex(chain_id_hex: &str) -> Result<&'static EvmChain, EthError> {
    let id = parse_chain_id(chain_id_hex)?;
    get_chain(id).ok_or_else(|| EthError::UnsupportedChain(chain_id_hex.to_string()))
}

/// Parses a `0x`-prefixed hex chain id into its numeric value.
pub fn parse_chain_id(chain_id_hex: &str) -> Result<u64, EthError> {
    let digits = chain_id_hex
        .strip_prefix("0x")
        .or_else(|| chain_id_hex.strip_prefix("0X"))
        .ok_or_else(|| EthError::UnsupportedChain(chain_id_hex.to_string()))?;
    u64::from_str_radix(digits, 16)
        .map_err(|_| EthError::UnsupportedChain(chain_id_hex.to_string()))
}

/// True when two hex chain ids name the same chain.
pub fn same_chain(a: &str, b: &str) -> bool {
    match (parse_chain_id(a), parse_chain_id(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Returns all supported EVM chain definitions.
pub fn supported_chains() -> Vec<&'static EvmChain> {
    ALL_CHAINS.to_vec()
}
