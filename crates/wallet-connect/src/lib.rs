//! Wallet discovery and connection for the bridge.
//!
//! EVM wallets announce themselves (EIP-6963 style) while Solana wallets are
//! probed at known injection points; both end up in one owned
//! [`ProviderRegistry`]. [`WalletConnector`] drives the
//! `Disconnected -> Connecting -> Connected` state machine and reacts to
//! provider-pushed account changes through a scoped [`Subscription`].

pub mod capability;
pub mod connector;
pub mod error;
pub mod evm;
pub mod registry;

pub use capability::{
    ChainFamily, EvmWalletCapability, ProviderError, ProviderEvent, SolanaWalletCapability,
    WalletDescriptor, WalletProvider,
};
pub use connector::{ConnectedWallet, ConnectionState, Subscription, WalletConnector};
pub use error::WalletError;
pub use evm::EvmWallet;
pub use registry::{
    DiscoveredWallet, DiscoveryTask, InjectionProbe, ProviderAnnouncement, ProviderRegistry,
    WalletCatalog,
};
