//! Asset transfer orchestration between external wallets and the venue
//! ledger.
//!
//! - Deposits: settlement asset to the fixed bridge contract; bridged
//!   assets to a generated address accepted only on a guardian quorum.
//! - Withdrawals: signed ledger actions, self-custody checked, with the
//!   same guardian gate for bridged assets.
//! - Intra-venue transfers between the spot and perp sub-ledgers.
//!
//! No key material lives here; every signature comes from the connected
//! wallet.

pub mod config;
pub mod error;
pub mod http;
pub mod ledger;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod tokens;

pub use config::{BridgeConfig, NetworkMode};
pub use error::BridgeError;
pub use http::{HttpAddressService, HttpSolanaRpc};
pub use ledger::{LedgerAction, SignedAction};
pub use orchestrator::{
    DepositAddress, Orchestrator, TransferDirection, TransferReceipt, WithdrawalReceipt,
};
pub use services::{
    AddressRequest, AddressService, FeeEstimate, GeneratedAddress, LedgerBalance, LedgerReceipt,
    SignatureStatus, SolanaRpc, VenueLedger,
};
pub use session::{SessionState, TransferSession};
pub use tokens::{SubLedger, SupportedToken, TokenChain, TokenRegistry};

pub use alloy_primitives::U256;
