//! Owned discovery state.
//!
//! EVM wallets announce themselves and are kept for the registry's lifetime;
//! Solana wallets are looked up through injection probes that are re-run on
//! every focus event, so a wallet installed while the app was in the
//! background shows up without a restart.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::capability::{
    ChainFamily, EvmWalletCapability, SolanaWalletCapability, WalletDescriptor, WalletProvider,
};

/// What `listAvailableWallets` returns: descriptors grouped by family.
pub type WalletCatalog = BTreeMap<ChainFamily, Vec<WalletDescriptor>>;

/// Looks for a Solana wallet at one known injection point.
pub type InjectionProbe = Box<dyn Fn() -> Option<Arc<dyn SolanaWalletCapability>> + Send + Sync>;

/// An EIP-6963 style `announceProvider` payload.
#[derive(Clone)]
pub struct ProviderAnnouncement {
    /// Reverse-DNS id, e.g. `io.metamask`.
    pub rdns: String,
    pub name: String,
    pub icon: Option<String>,
    pub provider: Arc<dyn EvmWalletCapability>,
}

/// A descriptor together with the provider handle behind it.
#[derive(Debug, Clone)]
pub struct DiscoveredWallet {
    pub descriptor: WalletDescriptor,
    pub provider: WalletProvider,
}

struct SolanaProbe {
    descriptor: WalletDescriptor,
    probe: InjectionProbe,
}

#[derive(Default)]
struct Inner {
    evm: Vec<DiscoveredWallet>,
    solana: Vec<DiscoveredWallet>,
    probes: Vec<SolanaProbe>,
}

pub struct ProviderRegistry {
    inner: RwLock<Inner>,
    catalog: watch::Sender<WalletCatalog>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        let empty = [ChainFamily::Evm, ChainFamily::Solana]
            .into_iter()
            .map(|family| (family, Vec::new()))
            .collect();
        Self {
            inner: RwLock::new(Inner::default()),
            catalog: watch::Sender::new(empty),
        }
    }

    /// Registers a Solana injection point. The probe runs on the next
    /// [`on_focus`](Self::on_focus).
    pub fn register_probe(&self, id: impl Into<String>, name: impl Into<String>, probe: InjectionProbe) {
        let descriptor = WalletDescriptor {
            id: id.into(),
            name: name.into(),
            family: ChainFamily::Solana,
            icon: None,
        };
        self.write().probes.push(SolanaProbe { descriptor, probe });
    }

    /// Records an announced EVM provider. A second announcement with an
    /// already-known id is ignored.
    pub fn announce(&self, announcement: ProviderAnnouncement) {
        {
            let mut inner = self.write();
            if inner.evm.iter().any(|w| w.descriptor.id == announcement.rdns) {
                debug!(id = %announcement.rdns, "duplicate provider announcement ignored");
                return;
            }
            info!(id = %announcement.rdns, name = %announcement.name, "evm wallet announced");
            inner.evm.push(DiscoveredWallet {
                descriptor: WalletDescriptor {
                    id: announcement.rdns,
                    name: announcement.name,
                    family: ChainFamily::Evm,
                    icon: announcement.icon,
                },
                provider: WalletProvider::Evm(announcement.provider),
            });
        }
        self.publish();
    }

    /// Re-runs every injection probe and rebuilds the Solana list.
    pub fn on_focus(&self) {
        {
            let mut inner = self.write();
            let found: Vec<DiscoveredWallet> = inner
                .probes
                .iter()
                .filter_map(|p| {
                    (p.probe)().map(|provider| DiscoveredWallet {
                        descriptor: p.descriptor.clone(),
                        provider: WalletProvider::Solana(provider),
                    })
                })
                .collect();
            debug!(count = found.len(), "solana injection points probed");
            inner.solana = found;
        }
        self.publish();
    }

    /// Current catalog. Never waits on discovery.
    pub fn list_available_wallets(&self) -> WalletCatalog {
        self.catalog.borrow().clone()
    }

    /// Receiver that observes every catalog change.
    pub fn subscribe(&self) -> watch::Receiver<WalletCatalog> {
        self.catalog.subscribe()
    }

    pub fn wallets(&self, family: ChainFamily) -> Vec<DiscoveredWallet> {
        let inner = self.read();
        match family {
            ChainFamily::Evm => inner.evm.clone(),
            ChainFamily::Solana => inner.solana.clone(),
        }
    }

    pub fn get(&self, family: ChainFamily, id: &str) -> Option<DiscoveredWallet> {
        self.wallets(family)
            .into_iter()
            .find(|w| w.descriptor.id == id)
    }

    /// Runs discovery in the background: every announcement is recorded and
    /// every focus event re-probes. Probes once up front. The task ends when
    /// both channels close, or when the returned handle is dropped.
    pub fn spawn_discovery(
        self: &Arc<Self>,
        mut announcements: mpsc::Receiver<ProviderAnnouncement>,
        mut focus: mpsc::Receiver<()>,
    ) -> DiscoveryTask {
        let registry = Arc::clone(self);
        let handle = tokio::spawn(async move {
            registry.on_focus();
            let mut announcements_open = true;
            let mut focus_open = true;
            while announcements_open || focus_open {
                tokio::select! {
                    msg = announcements.recv(), if announcements_open => match msg {
                        Some(a) => registry.announce(a),
                        None => announcements_open = false,
                    },
                    msg = focus.recv(), if focus_open => match msg {
                        Some(()) => registry.on_focus(),
                        None => focus_open = false,
                    },
                }
            }
            debug!("wallet discovery stopped");
        });
        DiscoveryTask { handle }
    }

    fn publish(&self) {
        let catalog = self.snapshot();
        self.catalog.send_if_modified(|current| {
            if *current == catalog {
                false
            } else {
                *current = catalog;
                true
            }
        });
    }

    fn snapshot(&self) -> WalletCatalog {
        let inner = self.read();
        let mut catalog = WalletCatalog::new();
        catalog.insert(
            ChainFamily::Evm,
            inner.evm.iter().map(|w| w.descriptor.clone()).collect(),
        );
        catalog.insert(
            ChainFamily::Solana,
            inner.solana.iter().map(|w| w.descriptor.clone()).collect(),
        );
        catalog
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the background discovery task; aborts it on drop.
pub struct DiscoveryTask {
    handle: JoinHandle<()>,
}

impl DiscoveryTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for DiscoveryTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
