//! Connection state machine: `Disconnected -> Connecting -> Connected`.
//!
//! Provider-pushed events are consumed by a listener task owned through a
//! [`Subscription`]; dropping the subscription (on disconnect or reconnect)
//! unsubscribes. Every connection gets a session number and a listener only
//! touches state while its session is still current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chain_eth::address::addresses_equal;
use chain_eth::personal_sign::verify_signer;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capability::{ChainFamily, ProviderEvent, WalletDescriptor, WalletProvider};
use crate::error::WalletError;
use crate::evm::EvmWallet;
use crate::registry::{DiscoveredWallet, ProviderRegistry};

/// The single connected wallet of a flow. Address, family and provider
/// live in one value so they are always set and cleared together.
#[derive(Debug, Clone)]
pub struct ConnectedWallet {
    pub family: ChainFamily,
    pub address: String,
    pub provider: WalletProvider,
    pub wallet_id: String,
    pub provider_name: String,
}

impl ConnectedWallet {
    pub fn evm(&self) -> Option<EvmWallet> {
        self.provider.as_evm().map(|p| EvmWallet::new(Arc::clone(p)))
    }
}

#[derive(Debug, Clone, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting {
        family: ChainFamily,
        wallet_id: String,
    },
    Connected(ConnectedWallet),
}

impl ConnectionState {
    pub fn wallet(&self) -> Option<&ConnectedWallet> {
        match self {
            ConnectionState::Connected(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

/// Owns a listener task; aborts it when dropped.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct WalletConnector {
    registry: Arc<ProviderRegistry>,
    state: Arc<watch::Sender<ConnectionState>>,
    session: Arc<AtomicU64>,
    listener: Mutex<Option<Subscription>>,
}

impl WalletConnector {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            state: Arc::new(watch::Sender::new(ConnectionState::Disconnected)),
            session: Arc::new(AtomicU64::new(0)),
            listener: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<ConnectedWallet> {
        self.state.borrow().wallet().cloned()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    // -----------------------------------------------------------------------
    // Connect
    // -----------------------------------------------------------------------

    /// Prompts the chosen wallet for account access.
    ///
    /// Fails with `WalletUnavailable` when no wallet of `family` has been
    /// discovered, and with `UserRejected` when the prompt is declined. Any
    /// previous connection is dropped first.
    pub async fn connect(&self, family: ChainFamily, wallet_id: &str) -> Result<ConnectedWallet, WalletError> {
        let wallets = self.registry.wallets(family);
        if wallets.is_empty() {
            return Err(WalletError::WalletUnavailable(family));
        }
        let wallet = wallets
            .into_iter()
            .find(|w| w.descriptor.id == wallet_id)
            .ok_or_else(|| WalletError::WalletNotFound(wallet_id.to_string()))?;

        let session = self.begin_session();
        self.state.send_replace(ConnectionState::Connecting {
            family,
            wallet_id: wallet_id.to_string(),
        });
        // Subscribe before the prompt so no event between approval and
        // listener start is lost.
        let events = wallet.provider.events();

        let address = match request_address(&wallet.provider).await {
            Ok(address) => address,
            Err(e) => {
                if self.is_current(session) {
                    self.state.send_replace(ConnectionState::Disconnected);
                }
                warn!(wallet = wallet_id, error = %e, "wallet connection failed");
                return Err(e);
            }
        };

        self.establish(session, wallet, address, events)
    }

    /// Sequentially asks each discovered wallet of `family`, without
    /// prompting, whether it already exposes `address`.
    pub async fn find_wallet_for_address(
        &self,
        family: ChainFamily,
        address: &str,
    ) -> Result<WalletDescriptor, WalletError> {
        self.probe_for_address(family, address)
            .await
            .map(|(wallet, _)| wallet.descriptor)
    }

    /// Connects to whichever wallet already authorizes `address`, without a
    /// prompt.
    pub async fn reattach(&self, family: ChainFamily, address: &str) -> Result<ConnectedWallet, WalletError> {
        let session = self.begin_session();
        let (wallet, reported) = match self.probe_for_address(family, address).await {
            Ok(found) => found,
            Err(e) => {
                if self.is_current(session) {
                    self.state.send_replace(ConnectionState::Disconnected);
                }
                return Err(e);
            }
        };
        let events = wallet.provider.events();
        self.establish(session, wallet, reported, events)
    }

    async fn probe_for_address(
        &self,
        family: ChainFamily,
        address: &str,
    ) -> Result<(DiscoveredWallet, String), WalletError> {
        for wallet in self.registry.wallets(family) {
            let exposed = match authorized_accounts(&wallet.provider).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    debug!(wallet = %wallet.descriptor.id, error = %e, "skipping wallet during address probe");
                    continue;
                }
            };
            if let Some(found) = exposed.into_iter().find(|a| same_address(family, a, address)) {
                return Ok((wallet, found));
            }
        }
        Err(WalletError::WalletNotFound(address.to_string()))
    }

    fn establish(
        &self,
        session: u64,
        wallet: DiscoveredWallet,
        address: String,
        events: broadcast::Receiver<ProviderEvent>,
    ) -> Result<ConnectedWallet, WalletError> {
        if !self.is_current(session) {
            return Err(WalletError::NotConnected);
        }

        let connected = ConnectedWallet {
            family: wallet.descriptor.family,
            address,
            provider: wallet.provider,
            wallet_id: wallet.descriptor.id,
            provider_name: wallet.descriptor.name,
        };
        info!(
            family = %connected.family,
            wallet = %connected.wallet_id,
            address = %connected.address,
            "wallet connected"
        );
        self.state.send_replace(ConnectionState::Connected(connected.clone()));

        let subscription = spawn_listener(
            connected.family,
            events,
            Arc::clone(&self.state),
            Arc::clone(&self.session),
            session,
        );
        *self.lock_listener() = Some(subscription);
        Ok(connected)
    }

    // -----------------------------------------------------------------------
    // Disconnect
    // -----------------------------------------------------------------------

    /// Clears the connection, then asks the provider to revoke access. A
    /// failed revocation is logged and otherwise ignored.
    pub async fn disconnect(&self) {
        self.begin_session();
        let previous = self.state.send_replace(ConnectionState::Disconnected);

        let Some(wallet) = previous.wallet() else {
            return;
        };
        info!(wallet = %wallet.wallet_id, "wallet disconnected");

        let revoked = match &wallet.provider {
            WalletProvider::Evm(p) => EvmWallet::new(Arc::clone(p)).revoke_permissions().await,
            WalletProvider::Solana(p) => p.disconnect().await.map_err(WalletError::from),
        };
        if let Err(e) = revoked {
            warn!(wallet = %wallet.wallet_id, error = %e, "provider did not revoke access");
        }
    }

    // -----------------------------------------------------------------------
    // Proof of control
    // -----------------------------------------------------------------------

    /// Has the connected wallet sign `message` and checks the signature
    /// against the connected address locally.
    pub async fn prove_control(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        let wallet = self.current().ok_or(WalletError::NotConnected)?;

        let (signature, valid) = match &wallet.provider {
            WalletProvider::Evm(p) => {
                let signature = EvmWallet::new(Arc::clone(p))
                    .personal_sign(&wallet.address, message)
                    .await?;
                let valid = verify_signer(message, &signature, &wallet.address)?;
                (signature, valid)
            }
            WalletProvider::Solana(p) => {
                let signature = p.sign_message(message).await?;
                let valid = chain_sol::verify_message(&wallet.address, message, &signature)?;
                (signature, valid)
            }
        };

        if !valid {
            return Err(WalletError::OwnershipProofFailed(format!(
                "signature was not produced by {}",
                wallet.address
            )));
        }
        Ok(signature)
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    fn begin_session(&self) -> u64 {
        self.lock_listener().take();
        self.session.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, session: u64) -> bool {
        self.session.load(Ordering::SeqCst) == session
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<Subscription>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn request_address(provider: &WalletProvider) -> Result<String, WalletError> {
    match provider {
        WalletProvider::Evm(p) => EvmWallet::new(Arc::clone(p))
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::InvalidResponse("wallet returned no accounts".into())),
        WalletProvider::Solana(p) => Ok(p.connect(false).await?),
    }
}

async fn authorized_accounts(provider: &WalletProvider) -> Result<Vec<String>, WalletError> {
    match provider {
        WalletProvider::Evm(p) => EvmWallet::new(Arc::clone(p)).accounts().await,
        WalletProvider::Solana(p) => Ok(vec![p.connect(true).await?]),
    }
}

fn same_address(family: ChainFamily, a: &str, b: &str) -> bool {
    match family {
        ChainFamily::Evm => addresses_equal(a, b),
        ChainFamily::Solana => a.eq_ignore_ascii_case(b),
    }
}

fn spawn_listener(
    family: ChainFamily,
    mut events: broadcast::Receiver<ProviderEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    sessions: Arc<AtomicU64>,
    session: u64,
) -> Subscription {
    let handle = tokio::spawn(async move {
        let current = || sessions.load(Ordering::SeqCst) == session;
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "wallet event listener lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => ProviderEvent::Disconnect,
            };
            if !current() {
                return;
            }

            match event {
                ProviderEvent::AccountsChanged(accounts) => {
                    let connected = state.borrow().wallet().map(|w| w.address.clone());
                    let Some(connected) = connected else { return };
                    match accounts.first() {
                        Some(next) if same_address(family, next, &connected) => {}
                        Some(next) if family == ChainFamily::Evm => {
                            info!(from = %connected, to = %next, "wallet switched account");
                            let next = next.clone();
                            update_if_current(&state, &sessions, session, |s| {
                                if let ConnectionState::Connected(w) = s {
                                    w.address = next;
                                }
                            });
                        }
                        _ => {
                            warn!(address = %connected, "wallet account went away, disconnecting");
                            update_if_current(&state, &sessions, session, |s| {
                                *s = ConnectionState::Disconnected;
                            });
                            return;
                        }
                    }
                }
                ProviderEvent::ChainChanged(chain_id) => {
                    debug!(%chain_id, "wallet changed network");
                }
                ProviderEvent::Disconnect => {
                    warn!("wallet provider disconnected");
                    update_if_current(&state, &sessions, session, |s| {
                        *s = ConnectionState::Disconnected;
                    });
                    return;
                }
            }
        }
    });
    Subscription { handle }
}

/// Applies `f` only while `session` is still live. The session is read
/// under the state lock, so a reconnect either lands first (and `f` is
/// skipped) or overwrites whatever `f` wrote.
fn update_if_current(
    state: &watch::Sender<ConnectionState>,
    sessions: &AtomicU64,
    session: u64,
    f: impl FnOnce(&mut ConnectionState),
) -> bool {
    state.send_if_modified(|s| {
        if sessions.load(Ordering::SeqCst) != session {
            return false;
        }
        f(s);
        true
    })
}
