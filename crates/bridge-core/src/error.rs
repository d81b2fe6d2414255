use thiserror::Error;
use wallet_connect::{ChainFamily, WalletError};

/// Errors surfaced by the transfer flows. None of them is retried here.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no {0} wallet available")]
    WalletUnavailable(ChainFamily),

    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("wallet is on network {current}, {required} is required")]
    NetworkMismatch { required: String, current: String },

    #[error("amount {amount} outside allowed range {min}..={max}")]
    AmountOutOfRange {
        amount: String,
        min: String,
        max: String,
    },

    #[error("guardian verification failed for {address}: {verified_count} valid signatures")]
    GuardianVerificationFailed {
        address: String,
        verified_count: usize,
    },

    #[error("connected wallet {connected} does not control venue account {account}")]
    SelfCustodyMismatch { connected: String, account: String },

    #[error("connected wallet changed from {expected} to {current} before submission")]
    WalletChanged { expected: String, current: String },

    #[error("chain submission failed: {0}")]
    ChainSubmissionFailed(String),

    #[error("unsupported token: {0}")]
    UnsupportedToken(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("wallet error: {0}")]
    Wallet(WalletError),
}

impl From<WalletError> for BridgeError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::WalletUnavailable(family) => BridgeError::WalletUnavailable(family),
            WalletError::UserRejected(message) => BridgeError::UserRejected(message),
            other => BridgeError::Wallet(other),
        }
    }
}

impl From<chain_eth::EthError> for BridgeError {
    fn from(e: chain_eth::EthError) -> Self {
        match e {
            chain_eth::EthError::UnsupportedChain(chain) => BridgeError::UnsupportedChain(chain),
            chain_eth::EthError::InvalidAddress(a) => BridgeError::InvalidAddress(format!("ETH: {a}")),
            other => BridgeError::ChainSubmissionFailed(format!("ETH: {other}")),
        }
    }
}

impl From<chain_sol::SolError> for BridgeError {
    fn from(e: chain_sol::SolError) -> Self {
        match e {
            chain_sol::SolError::InvalidAddress(a) => BridgeError::InvalidAddress(format!("SOL: {a}")),
            other => BridgeError::ChainSubmissionFailed(format!("SOL: {other}")),
        }
    }
}

impl BridgeError {
    /// True for failures that must end the flow instance with no fallback.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BridgeError::GuardianVerificationFailed { .. } | BridgeError::SelfCustodyMismatch { .. }
        )
    }
}
