//! Per-family wallet capabilities.
//!
//! Concrete adapters (browser bridge, mobile SDK, test doubles) implement
//! one trait per chain family; everything above this module works with the
//! tagged [`WalletProvider`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFamily::Evm => f.write_str("evm"),
            ChainFamily::Solana => f.write_str("solana"),
        }
    }
}

/// What the UI lists for a discovered wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    /// Stable id: the reverse-DNS name for announced EVM wallets, the
    /// injection point for Solana wallets.
    pub id: String,
    pub name: String,
    pub family: ChainFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// An error surfaced by a wallet provider, EIP-1193 style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Events a provider pushes without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// EVM `accountsChanged`; Solana adapters report the new key as a
    /// one-element list, or an empty list when the account went away.
    AccountsChanged(Vec<String>),
    /// EVM `chainChanged` with the new hex chain id.
    ChainChanged(String),
    /// The provider lost its connection.
    Disconnect,
}

/// An EIP-1193 provider.
#[async_trait]
pub trait EvmWalletCapability: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError>;

    fn events(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// A Solana wallet-standard style provider.
#[async_trait]
pub trait SolanaWalletCapability: Send + Sync {
    /// Connects and returns the Base58 public key. With `only_if_trusted`
    /// the wallet must not prompt and fails if not already authorized.
    async fn connect(&self, only_if_trusted: bool) -> Result<String, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Signs raw message bytes (UTF-8 display encoding) and returns the
    /// 64-byte Ed25519 signature.
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, ProviderError>;

    /// Signs and broadcasts a serialized transaction; returns the Base58
    /// transaction signature.
    async fn sign_and_send_transaction(&self, transaction: &[u8]) -> Result<String, ProviderError>;

    fn events(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// A provider handle tagged with its family.
#[derive(Clone)]
pub enum WalletProvider {
    Evm(Arc<dyn EvmWalletCapability>),
    Solana(Arc<dyn SolanaWalletCapability>),
}

impl WalletProvider {
    pub fn family(&self) -> ChainFamily {
        match self {
            WalletProvider::Evm(_) => ChainFamily::Evm,
            WalletProvider::Solana(_) => ChainFamily::Solana,
        }
    }

    pub fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        match self {
            WalletProvider::Evm(p) => p.events(),
            WalletProvider::Solana(p) => p.events(),
        }
    }

    pub fn as_evm(&self) -> Option<&Arc<dyn EvmWalletCapability>> {
        match self {
            WalletProvider::Evm(p) => Some(p),
            WalletProvider::Solana(_) => None,
        }
    }

    pub fn as_solana(&self) -> Option<&Arc<dyn SolanaWalletCapability>> {
        match self {
            WalletProvider::Solana(p) => Some(p),
            WalletProvider::Evm(_) => None,
        }
    }

    /// True when both handles point at the same provider object.
    pub fn same_provider(&self, other: &WalletProvider) -> bool {
        match (self, other) {
            (WalletProvider::Evm(a), WalletProvider::Evm(b)) => Arc::ptr_eq(a, b),
            (WalletProvider::Solana(a), WalletProvider::Solana(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for WalletProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletProvider::Evm(_) => f.write_str("WalletProvider::Evm(..)"),
            WalletProvider::Solana(_) => f.write_str("WalletProvider::Solana(..)"),
        }
    }
}
