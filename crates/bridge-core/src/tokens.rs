use alloy_primitives::utils::{format_units, parse_units, ParseUnits};
use alloy_primitives::U256;
use chain_eth::chains::{EvmChain, ARBITRUM, ARBITRUM_SEPOLIA, ETHEREUM, SEPOLIA};
use serde::Serialize;
use wallet_connect::ChainFamily;

use crate::config::NetworkMode;
use crate::error::BridgeError;

// ─── Chains ──────────────────────────────────────────────────────────

/// External chain a token is held on before it reaches the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenChain {
    Ethereum,
    Sepolia,
    Arbitrum,
    ArbitrumSepolia,
    Solana,
    SolanaDevnet,
}

impl TokenChain {
    pub fn family(&self) -> ChainFamily {
        match self {
            TokenChain::Solana | TokenChain::SolanaDevnet => ChainFamily::Solana,
            _ => ChainFamily::Evm,
        }
    }

    pub fn evm_chain(&self) -> Option<&'static EvmChain> {
        match self {
            TokenChain::Ethereum => Some(&ETHEREUM),
            TokenChain::Sepolia => Some(&SEPOLIA),
            TokenChain::Arbitrum => Some(&ARBITRUM),
            TokenChain::ArbitrumSepolia => Some(&ARBITRUM_SEPOLIA),
            TokenChain::Solana | TokenChain::SolanaDevnet => None,
        }
    }

    /// Identifier used for wallet-network matching: hex chain id on EVM,
    /// `"501"` on Solana.
    pub fn chain_id(&self) -> String {
        match self.evm_chain() {
            Some(chain) => chain.chain_id_hex(),
            None => chain_sol::SOLANA_CHAIN_ID.to_string(),
        }
    }

    /// Chain name the address service uses in routes and proposals.
    pub fn bridge_name(&self) -> &'static str {
        match self {
            TokenChain::Ethereum | TokenChain::Sepolia => "ethereum",
            TokenChain::Arbitrum | TokenChain::ArbitrumSepolia => "arbitrum",
            TokenChain::Solana | TokenChain::SolanaDevnet => "solana",
        }
    }

    pub fn is_testnet(&self) -> bool {
        matches!(
            self,
            TokenChain::Sepolia | TokenChain::ArbitrumSepolia | TokenChain::SolanaDevnet
        )
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        match self.evm_chain() {
            Some(chain) => chain.tx_url(tx_hash),
            None => chain_sol::tx_url(tx_hash, self.is_testnet()),
        }
    }
}

// ─── Tokens ──────────────────────────────────────────────────────────

/// Which venue sub-ledger holds an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubLedger {
    Spot,
    Perp,
}

/// Static description of a bridgeable asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedToken {
    /// Symbol, e.g. `USDC`.
    pub id: String,
    pub chain: TokenChain,
    /// Set for bridged assets: the chain name the asset comes from.
    pub source_chain_name: Option<String>,
    /// Asset id as the address service knows it (`eth`, `sol`).
    pub bridge_asset: Option<String>,
    pub decimals: u8,
    /// In base units.
    pub minimum_transfer_amount: U256,
    pub requires_guardian_bridging: bool,
    /// ERC-20 contract on `chain`; `None` for the chain's native asset.
    pub contract_address: Option<String>,
    pub ledger_asset_name: String,
    /// `NAME:0x<token id>` as the venue identifies the spot token.
    pub ledger_token_address: Option<String>,
    pub ledger: SubLedger,
}

impl SupportedToken {
    pub fn family(&self) -> ChainFamily {
        self.chain.family()
    }

    pub fn is_native(&self) -> bool {
        self.contract_address.is_none()
    }

    /// Parses a decimal amount (`"12.5"`) into base units.
    pub fn parse_amount(&self, amount: &str) -> Result<U256, BridgeError> {
        match parse_units(amount.trim(), self.decimals) {
            Ok(ParseUnits::U256(value)) => Ok(value),
            Ok(ParseUnits::I256(_)) => Err(BridgeError::AmountOutOfRange {
                amount: amount.to_string(),
                min: self.format_amount(self.minimum_transfer_amount),
                max: "unbounded".into(),
            }),
            Err(e) => Err(BridgeError::Config(format!("invalid amount {amount}: {e}"))),
        }
    }

    /// Formats base units as a decimal string without trailing zeros.
    pub fn format_amount(&self, amount: U256) -> String {
        match format_units(amount, self.decimals) {
            Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
            Ok(s) => s,
            Err(_) => amount.to_string(),
        }
    }
}

fn base_units(mantissa: u64, exponent: u8) -> U256 {
    U256::from(mantissa) * U256::from(10u64).pow(U256::from(exponent))
}

fn usdc(chain: TokenChain, contract: &str, ledger_token: &str) -> SupportedToken {
    SupportedToken {
        id: "USDC".into(),
        chain,
        source_chain_name: None,
        bridge_asset: None,
        decimals: 6,
        minimum_transfer_amount: base_units(5, 6),
        requires_guardian_bridging: false,
        contract_address: Some(contract.into()),
        ledger_asset_name: "USDC".into(),
        ledger_token_address: Some(ledger_token.into()),
        ledger: SubLedger::Perp,
    }
}

fn eth(chain: TokenChain, ledger_token: &str) -> SupportedToken {
    SupportedToken {
        id: "ETH".into(),
        chain,
        source_chain_name: Some("ethereum".into()),
        bridge_asset: Some("eth".into()),
        decimals: 18,
        minimum_transfer_amount: base_units(7, 15),
        requires_guardian_bridging: true,
        contract_address: None,
        ledger_asset_name: "UETH".into(),
        ledger_token_address: Some(ledger_token.into()),
        ledger: SubLedger::Spot,
    }
}

fn sol(chain: TokenChain, ledger_token: &str) -> SupportedToken {
    SupportedToken {
        id: "SOL".into(),
        chain,
        source_chain_name: Some("solana".into()),
        bridge_asset: Some("sol".into()),
        decimals: chain_sol::SOL_DECIMALS,
        minimum_transfer_amount: base_units(2, 8),
        requires_guardian_bridging: true,
        contract_address: None,
        ledger_asset_name: "USOL".into(),
        ledger_token_address: Some(ledger_token.into()),
        ledger: SubLedger::Spot,
    }
}

/// The token table for one network mode.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    mode: NetworkMode,
    tokens: Vec<SupportedToken>,
}

impl TokenRegistry {
    pub fn mainnet() -> Self {
        Self {
            mode: NetworkMode::Mainnet,
            tokens: vec![
                usdc(
                    TokenChain::Arbitrum,
                    "0xaf88d065e77c8cc2239327c5edb3a432268e5831",
                    "USDC:0x6d1e7cde53ba9467b783cb7c530ce054",
                ),
                eth(TokenChain::Ethereum, "UETH:0xe1edd30daaf5caac3fe63569e24748da"),
                sol(TokenChain::Solana, "USOL:0x49b67c39f5566535de22b29b0e51e685"),
            ],
        }
    }

    pub fn testnet() -> Self {
        Self {
            mode: NetworkMode::Testnet,
            tokens: vec![
                usdc(
                    TokenChain::ArbitrumSepolia,
                    "0x1baabb04529d43a73232b713c0fe471f7c7334d5",
                    "USDC:0xeb62eee3685fc4c43992febcd9e75443",
                ),
                eth(TokenChain::Sepolia, "UETH:0xe2e5c1d6a4b7bd9b4d6e1ec5a6e0a4c4"),
                sol(TokenChain::SolanaDevnet, "USOL:0x7eb7c2a1e3a41c3a7b8e45f0c3b7d2d9"),
            ],
        }
    }

    pub fn for_mode(mode: NetworkMode) -> Self {
        match mode {
            NetworkMode::Mainnet => Self::mainnet(),
            NetworkMode::Testnet => Self::testnet(),
        }
    }

    pub fn mode(&self) -> NetworkMode {
        self.mode
    }

    /// Looks a token up by symbol, case-insensitively.
    pub fn get(&self, id: &str) -> Result<&SupportedToken, BridgeError> {
        self.tokens
            .iter()
            .find(|t| t.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| BridgeError::UnsupportedToken(id.to_string()))
    }

    pub fn all(&self) -> &[SupportedToken] {
        &self.tokens
    }

    /// The asset the venue settles in directly, deposited to the fixed
    /// bridge contract without guardians.
    pub fn settlement_token(&self) -> Option<&SupportedToken> {
        self.tokens.iter().find(|t| !t.requires_guardian_bridging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_table() {
        let tokens = TokenRegistry::mainnet();
        let usdc = tokens.get("usdc").unwrap();
        assert_eq!(usdc.chain.chain_id(), "0xa4b1");
        assert!(!usdc.requires_guardian_bridging);
        assert_eq!(usdc.minimum_transfer_amount, U256::from(5_000_000u64));
        assert_eq!(tokens.settlement_token().unwrap().id, "USDC");

        let eth = tokens.get("ETH").unwrap();
        assert!(eth.is_native());
        assert_eq!(eth.chain.chain_id(), "0x1");
        assert_eq!(eth.ledger_asset_name, "UETH");

        let sol = tokens.get("SOL").unwrap();
        assert_eq!(sol.family(), ChainFamily::Solana);
        assert_eq!(sol.chain.chain_id(), "501");
        assert_eq!(sol.minimum_transfer_amount, U256::from(200_000_000u64));
    }

    #[test]
    fn testnet_table_uses_test_chains() {
        let tokens = TokenRegistry::testnet();
        assert!(tokens.all().iter().all(|t| t.chain.is_testnet()));
        assert_eq!(tokens.get("ETH").unwrap().chain.chain_id(), "0xaa36a7");
        assert_eq!(tokens.get("USDC").unwrap().chain.chain_id(), "0x66eee");
    }

    #[test]
    fn unknown_token_is_unsupported() {
        let err = TokenRegistry::mainnet().get("DOGE").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedToken(t) if t == "DOGE"));
    }

    #[test]
    fn amounts_parse_and_format_in_token_decimals() {
        let tokens = TokenRegistry::mainnet();
        let usdc = tokens.get("USDC").unwrap();
        assert_eq!(usdc.parse_amount("12.5").unwrap(), U256::from(12_500_000u64));
        assert_eq!(usdc.format_amount(U256::from(12_500_000u64)), "12.5");
        assert_eq!(usdc.format_amount(U256::from(5_000_000u64)), "5");

        let sol = tokens.get("SOL").unwrap();
        assert_eq!(sol.parse_amount("0.2").unwrap(), U256::from(200_000_000u64));
        assert!(sol.parse_amount("abc").is_err());
    }

    #[test]
    fn explorer_links_follow_the_chain() {
        assert_eq!(
            TokenChain::Arbitrum.tx_url("0xabc"),
            "https://arbiscan.io/tx/0xabc"
        );
        assert_eq!(
            TokenChain::SolanaDevnet.tx_url("5sig"),
            "https://solscan.io/tx/5sig?cluster=devnet"
        );
    }
}
