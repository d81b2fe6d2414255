use thiserror::Error;

use crate::capability::{ChainFamily, ProviderError};

/// EIP-1193 / Solana wallet-adapter code for a user-declined prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no {0} wallet available")]
    WalletUnavailable(ChainFamily),

    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("user rejected the request: {0}")]
    UserRejected(String),

    #[error("no wallet connected")]
    NotConnected,

    #[error("provider error{}: {message}", .code.map(|c| format!(" {c}")).unwrap_or_default())]
    Provider { code: Option<i64>, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("ownership proof failed: {0}")]
    OwnershipProofFailed(String),
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        if e.code == Some(USER_REJECTED_CODE) {
            WalletError::UserRejected(e.message)
        } else {
            WalletError::Provider {
                code: e.code,
                message: e.message,
            }
        }
    }
}

impl From<chain_eth::EthError> for WalletError {
    fn from(e: chain_eth::EthError) -> Self {
        WalletError::InvalidResponse(format!("ETH: {e}"))
    }
}

impl From<chain_sol::SolError> for WalletError {
    fn from(e: chain_sol::SolError) -> Self {
        WalletError::InvalidResponse(format!("SOL: {e}"))
    }
}
