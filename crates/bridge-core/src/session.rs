//! UI-facing state for one transfer dialog.
//!
//! The session publishes a [`SessionState`] snapshot on a `watch` channel.
//! After [`TransferSession::abandon`] (or drop) nothing is published any
//! more. Abandoning does not cancel a submission already in flight: a
//! transaction handed to the wallet completes or fails on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use alloy_primitives::U256;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wallet_connect::{ChainFamily, ConnectionState, WalletError};

use crate::error::BridgeError;
use crate::orchestrator::{Orchestrator, TransferReceipt, WithdrawalReceipt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub venue_address: Option<String>,
    /// Connected wallet balance of `token`, in base units.
    pub balance: Option<U256>,
    pub deposit_address: Option<String>,
    /// Guardian verdict for `deposit_address`; `None` when no verification
    /// applies or none has completed.
    pub verified: Option<bool>,
    /// Non-blocking message for the user (a toast).
    pub notice: Option<String>,
    pub loading: bool,
}

struct Shared {
    orchestrator: Arc<Orchestrator>,
    state: watch::Sender<SessionState>,
    active: AtomicBool,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        if self.active.load(Ordering::SeqCst) {
            self.state.send_modify(f);
        }
    }

    fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    async fn refresh_balance(&self) {
        let Some(token) = self.snapshot().token else {
            return;
        };
        let result = self.orchestrator.balance(&token).await;
        self.update(|s| {
            if s.token.as_deref() != Some(token.as_str()) {
                return;
            }
            match result {
                Ok(balance) => s.balance = Some(balance),
                Err(BridgeError::Wallet(WalletError::NotConnected)) => s.balance = None,
                Err(e) => {
                    warn!(%token, error = %e, "balance fetch failed");
                    s.balance = None;
                    s.notice = Some(format!("could not fetch {token} balance: {e}"));
                }
            }
        });
    }

    async fn refresh_deposit_address(&self) {
        let snapshot = self.snapshot();
        let (Some(token), Some(venue)) = (snapshot.token, snapshot.venue_address) else {
            return;
        };
        let result = self.orchestrator.deposit_address(&token, &venue).await;
        self.update(|s| {
            if s.token.as_deref() != Some(token.as_str()) {
                return;
            }
            match result {
                Ok(deposit) => {
                    s.verified = deposit.verified();
                    s.deposit_address = Some(deposit.address);
                }
                Err(e) => {
                    warn!(%token, error = %e, "deposit address unavailable");
                    s.deposit_address = None;
                    s.verified = None;
                    s.notice = Some(format!("could not get a {token} deposit address: {e}"));
                }
            }
        });
    }

    fn selection(&self) -> Result<(String, String), BridgeError> {
        let snapshot = self.snapshot();
        match (snapshot.token, snapshot.venue_address) {
            (Some(token), Some(venue)) => Ok((token, venue)),
            _ => Err(BridgeError::UnsupportedToken("no token selected".into())),
        }
    }
}

pub struct TransferSession {
    shared: Arc<Shared>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl TransferSession {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                orchestrator,
                state: watch::Sender::new(SessionState::default()),
                active: AtomicBool::new(true),
            }),
            watcher: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.shared.snapshot()
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Selects a token and re-fetches its balance and deposit address.
    pub async fn select_token(&self, token_id: &str, venue_address: &str) {
        self.shared.update(|s| {
            *s = SessionState {
                token: Some(token_id.to_string()),
                venue_address: Some(venue_address.to_string()),
                loading: true,
                ..SessionState::default()
            };
        });
        self.shared.refresh_balance().await;
        self.shared.refresh_deposit_address().await;
        self.shared.update(|s| s.loading = false);
    }

    pub async fn refresh_balance(&self) {
        self.shared.refresh_balance().await;
    }

    pub fn dismiss_notice(&self) {
        self.shared.update(|s| s.notice = None);
    }

    /// Re-fetches the balance whenever the connected wallet changes.
    pub fn watch_wallet(&self) {
        let shared = Arc::clone(&self.shared);
        let mut rx = shared.orchestrator.connector().subscribe_state();
        let mut last = wallet_key(&rx.borrow_and_update());
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                if !shared.active.load(Ordering::SeqCst) {
                    break;
                }
                let key = wallet_key(&rx.borrow_and_update());
                if key != last {
                    debug!(?key, "connected wallet changed, refreshing balance");
                    last = key;
                    shared.refresh_balance().await;
                }
            }
        });
        if let Some(previous) = self.lock_watcher().replace(handle) {
            previous.abort();
        }
    }

    /// Deposits `amount` of the selected token.
    pub async fn deposit(&self, amount: U256) -> Result<TransferReceipt, BridgeError> {
        let (token, venue) = self.shared.selection()?;
        let receipt = self.shared.orchestrator.deposit(&token, &venue, amount).await?;
        self.shared.refresh_balance().await;
        Ok(receipt)
    }

    /// Withdraws `amount` of the selected token to `destination`.
    pub async fn withdraw(&self, destination: &str, amount: U256) -> Result<WithdrawalReceipt, BridgeError> {
        let (token, venue) = self.shared.selection()?;
        self.shared
            .orchestrator
            .withdraw(&token, &venue, destination, amount)
            .await
    }

    /// Stops every further state update. Idempotent.
    pub fn abandon(&self) {
        self.shared.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.lock_watcher().take() {
            handle.abort();
        }
    }

    fn lock_watcher(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        self.abandon();
    }
}

fn wallet_key(state: &ConnectionState) -> Option<(ChainFamily, String)> {
    state.wallet().map(|w| (w.family, w.address.to_lowercase()))
}
